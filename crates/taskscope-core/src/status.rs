//! Status and classification enums for Tasks and Events.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// Lifecycle status of a Task, as reported by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    /// Task accepted but not yet started.
    #[default]
    Created,
    /// Task is executing.
    Running,
    /// Reserved by the server: waiting for a worker slot.
    Queued,
    /// Reserved by the server: blocked on user input.
    WaitingInput,
    /// Reserved by the server: blocked on an approval decision.
    WaitingApproval,
    /// Reserved by the server: paused by an operator.
    Paused,
    /// Task completed successfully.
    Succeeded,
    /// Task failed.
    Failed,
    /// Task was cancelled by user or system.
    Cancelled,
    /// Reserved by the server: rejected before execution.
    Rejected,
}

impl TaskStatus {
    /// Every status the client understands, in display order.
    pub const ALL: [TaskStatus; 10] = [
        Self::Created,
        Self::Running,
        Self::Queued,
        Self::WaitingInput,
        Self::WaitingApproval,
        Self::Paused,
        Self::Succeeded,
        Self::Failed,
        Self::Cancelled,
        Self::Rejected,
    ];

    /// Returns true if no further transition is expected.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Succeeded | Self::Failed | Self::Cancelled | Self::Rejected
        )
    }

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Created => "CREATED",
            Self::Running => "RUNNING",
            Self::Queued => "QUEUED",
            Self::WaitingInput => "WAITING_INPUT",
            Self::WaitingApproval => "WAITING_APPROVAL",
            Self::Paused => "PAUSED",
            Self::Succeeded => "SUCCEEDED",
            Self::Failed => "FAILED",
            Self::Cancelled => "CANCELLED",
            Self::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::InvalidStatus(s.to_string()))
    }
}

/// Type of a task event. Also the name of the push channel it arrives on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    TaskCreated,
    UserMessage,
    ModelCallStarted,
    ModelCallCompleted,
    ModelCallFailed,
    /// Carries `from_status` / `to_status` in its payload.
    StateTransition,
    ArtifactCreated,
    Error,
}

impl EventType {
    /// All event types, which is also the set of named stream channels.
    pub const ALL: [EventType; 8] = [
        Self::TaskCreated,
        Self::UserMessage,
        Self::ModelCallStarted,
        Self::ModelCallCompleted,
        Self::ModelCallFailed,
        Self::StateTransition,
        Self::ArtifactCreated,
        Self::Error,
    ];

    /// Wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TaskCreated => "TASK_CREATED",
            Self::UserMessage => "USER_MESSAGE",
            Self::ModelCallStarted => "MODEL_CALL_STARTED",
            Self::ModelCallCompleted => "MODEL_CALL_COMPLETED",
            Self::ModelCallFailed => "MODEL_CALL_FAILED",
            Self::StateTransition => "STATE_TRANSITION",
            Self::ArtifactCreated => "ARTIFACT_CREATED",
            Self::Error => "ERROR",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|ty| ty.as_str() == s)
            .ok_or_else(|| CoreError::InvalidEventType(s.to_string()))
    }
}

/// Risk classification assigned to a task by the server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        })
    }
}
