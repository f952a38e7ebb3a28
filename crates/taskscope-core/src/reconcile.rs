//! Folding streamed events into a snapshot-loaded timeline.
//!
//! The server is authoritative: status changes carried by STATE_TRANSITION
//! events are applied without checking transition legality. The only rule the
//! client enforces is that a terminal status is never left.
//!
//! Events are kept in arrival order. `task_seq` is carried for display and is
//! never used to reorder.

use std::collections::HashSet;

use crate::{Artifact, EventId, StreamEventEnvelope, Task, TaskEvent, TaskId, TaskStatus};

/// Merge one envelope into an event list.
///
/// Returns the list unchanged when an event with the same `event_id` is already
/// present, otherwise the list with the envelope's event appended.
pub fn reconcile(mut events: Vec<TaskEvent>, envelope: &StreamEventEnvelope) -> Vec<TaskEvent> {
    if events.iter().any(|e| e.event_id == envelope.event.event_id) {
        return events;
    }
    events.push(envelope.clone().into_event());
    events
}

/// Status an envelope asks the task to move to, if any.
pub fn derive_status(envelope: &StreamEventEnvelope) -> Option<TaskStatus> {
    envelope.event.to_status()
}

/// A status change applied by the reconciler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub from: TaskStatus,
    pub to: TaskStatus,
}

impl StatusChange {
    /// True when this change moved the task into a terminal status.
    pub fn entered_terminal(&self) -> bool {
        !self.from.is_terminal() && self.to.is_terminal()
    }
}

/// Outcome of applying one envelope to a [`Timeline`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reconciled {
    /// Event appended, with the status change it caused (if any).
    Appended { status_change: Option<StatusChange> },
    /// An event with this id is already in the timeline.
    Duplicate,
    /// Envelope belongs to a different task; nothing was touched.
    ForeignTask { task_id: TaskId },
}

/// In-memory copy of one task's state: metadata, event list and artifacts.
#[derive(Debug, Clone)]
pub struct Timeline {
    task: Task,
    events: Vec<TaskEvent>,
    artifacts: Vec<Artifact>,
    seen: HashSet<EventId>,
}

impl Timeline {
    /// Build a timeline from a snapshot.
    ///
    /// Duplicate event ids in the snapshot keep their first occurrence.
    pub fn new(task: Task, events: Vec<TaskEvent>, artifacts: Vec<Artifact>) -> Self {
        let mut seen = HashSet::with_capacity(events.len());
        let events = events
            .into_iter()
            .filter(|e| seen.insert(e.event_id.clone()))
            .collect();

        Self {
            task,
            events,
            artifacts,
            seen,
        }
    }

    /// Apply a streamed envelope.
    pub fn apply(&mut self, envelope: StreamEventEnvelope) -> Reconciled {
        if envelope.task_id != self.task.task_id {
            return Reconciled::ForeignTask {
                task_id: envelope.task_id,
            };
        }

        // The id index answers duplicates without scanning the list.
        if self.seen.contains(&envelope.event.event_id) {
            return Reconciled::Duplicate;
        }

        self.events = reconcile(std::mem::take(&mut self.events), &envelope);
        self.seen.insert(envelope.event.event_id.clone());

        let status_change = derive_status(&envelope).and_then(|to| self.transition(to));
        Reconciled::Appended { status_change }
    }

    fn transition(&mut self, to: TaskStatus) -> Option<StatusChange> {
        let from = self.task.status;
        // Terminal is absorbing.
        if from.is_terminal() || from == to {
            return None;
        }
        self.task.status = to;
        Some(StatusChange { from, to })
    }

    pub fn task(&self) -> &Task {
        &self.task
    }

    pub fn status(&self) -> TaskStatus {
        self.task.status
    }

    pub fn is_terminal(&self) -> bool {
        self.task.is_terminal()
    }

    /// Events in arrival order.
    pub fn events(&self) -> &[TaskEvent] {
        &self.events
    }

    pub fn artifacts(&self) -> &[Artifact] {
        &self.artifacts
    }

    pub fn contains(&self, event_id: &EventId) -> bool {
        self.seen.contains(event_id)
    }
}
