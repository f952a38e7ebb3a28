//! Task types as returned by the task list and task detail endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{RiskLevel, TaskId, TaskStatus};

/// Who asked for the task and through which channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequesterInfo {
    /// Ingress channel (e.g. "web", "telegram").
    pub channel: String,
    /// Sender identifier within the channel.
    pub sender_id: String,
}

/// A Task as held by the detail view.
///
/// Created from the snapshot load. After that only the reconciler touches it,
/// and only its `status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique task identifier.
    pub task_id: TaskId,

    /// When the task was created.
    pub created_at: DateTime<Utc>,

    /// When the server last changed the task.
    pub updated_at: DateTime<Utc>,

    /// Current task status.
    pub status: TaskStatus,

    /// Human-readable title.
    pub title: String,

    /// Conversation thread the task belongs to.
    pub thread_id: String,

    /// Owning scope.
    pub scope_id: String,

    /// Requester info.
    #[serde(default)]
    pub requester: RequesterInfo,

    /// Server-assigned risk level.
    #[serde(default)]
    pub risk_level: RiskLevel,
}

impl Task {
    /// Check if the task is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Project the task onto a list item.
    pub fn summary(&self) -> TaskSummary {
        TaskSummary {
            task_id: self.task_id.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
            status: self.status,
            title: self.title.clone(),
            thread_id: self.thread_id.clone(),
            scope_id: self.scope_id.clone(),
            risk_level: self.risk_level,
        }
    }
}

/// A Task as shown in the list view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub task_id: TaskId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: TaskStatus,
    pub title: String,
    pub thread_id: String,
    pub scope_id: String,
    #[serde(default)]
    pub risk_level: RiskLevel,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_detail_from_wire() {
        let json = r#"{
            "task_id": "t1",
            "created_at": "2026-01-01T00:00:00+00:00",
            "updated_at": "2026-01-01T00:00:05+00:00",
            "status": "RUNNING",
            "title": "Summarize report",
            "thread_id": "th1",
            "scope_id": "sc1",
            "requester": {"channel": "web", "sender_id": "owner"},
            "risk_level": "low"
        }"#;

        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.task_id, TaskId::new("t1"));
        assert_eq!(task.status, TaskStatus::Running);
        assert_eq!(task.requester.channel, "web");
        assert!(!task.is_terminal());

        let summary = task.summary();
        assert_eq!(summary.title, "Summarize report");
        assert_eq!(summary.status, TaskStatus::Running);
    }

    #[test]
    fn test_summary_defaults_risk_level() {
        let json = r#"{
            "task_id": "t2",
            "created_at": "2026-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z",
            "status": "SUCCEEDED",
            "title": "done",
            "thread_id": "th",
            "scope_id": "sc"
        }"#;

        let summary: TaskSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.risk_level, RiskLevel::Low);
        assert!(summary.status.is_terminal());
    }
}
