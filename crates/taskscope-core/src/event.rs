//! Task events and the stream envelope that carries them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EventId, EventType, TaskId, TaskStatus};

/// Open key-value payload attached to an event.
pub type EventPayload = Map<String, Value>;

/// An immutable record of something that happened during a task's execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEvent {
    /// Event identifier, unique within the task.
    pub event_id: EventId,

    /// Monotonic per-task sequence number. Display only; never used for ordering.
    pub task_seq: u64,

    /// When the event occurred.
    pub ts: DateTime<Utc>,

    /// Type of event.
    #[serde(rename = "type")]
    pub event_type: EventType,

    /// Who produced the event (user, kernel, worker, tool, system).
    pub actor: String,

    /// Event-specific payload.
    #[serde(default)]
    pub payload: EventPayload,
}

impl TaskEvent {
    /// Target status of a STATE_TRANSITION event.
    ///
    /// Returns `None` for other event types, for a missing `to_status`, and for
    /// status strings this client does not know.
    pub fn to_status(&self) -> Option<TaskStatus> {
        if self.event_type != EventType::StateTransition {
            return None;
        }
        self.payload
            .get("to_status")
            .and_then(Value::as_str)
            .and_then(|s| s.parse().ok())
    }
}

/// Wire wrapper around an event delivered over the push channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StreamEventEnvelope {
    /// The event itself.
    #[serde(flatten)]
    pub event: TaskEvent,

    /// Task the server believes this event belongs to.
    pub task_id: TaskId,

    /// Set on the last event the server will send on this stream.
    #[serde(rename = "final", default)]
    pub is_final: bool,
}

impl StreamEventEnvelope {
    /// Event identifier of the wrapped event.
    pub fn event_id(&self) -> &EventId {
        &self.event.event_id
    }

    /// Unwrap into the normalized event stored in the timeline.
    pub fn into_event(self) -> TaskEvent {
        self.event
    }
}
