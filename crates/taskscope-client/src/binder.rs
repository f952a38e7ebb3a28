//! Task detail view binder.
//!
//! A [`TaskDetailBinder`] is mounted once per viewed task. It takes the
//! snapshot load result, decides whether the push stream should run, folds
//! streamed envelopes into its [`Timeline`] and exposes an immutable
//! [`DetailSnapshot`] for rendering.
//!
//! Loads are issued by the owner and reported back with the mount's
//! [`MountToken`]. A result carrying another token, or arriving after
//! [`TaskDetailBinder::dispose`], is discarded.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use taskscope_core::{Artifact, Reconciled, StreamEventEnvelope, Task, TaskEvent, TaskId, Timeline};

use crate::api::TaskSnapshot;
use crate::snapshot::LoadError;
use crate::stream::{StreamManager, StreamStatus};
use crate::transport::PushTransport;

static NEXT_MOUNT: AtomicU64 = AtomicU64::new(1);

/// Identifies one mount of a binder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MountToken(u64);

impl MountToken {
    fn next() -> Self {
        Self(NEXT_MOUNT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Lifecycle phase of the detail view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailPhase {
    Loading,
    Ready,
}

/// Render snapshot of the detail view.
#[derive(Debug, Clone)]
pub struct DetailSnapshot {
    pub task_id: TaskId,
    pub phase: DetailPhase,
    pub task: Option<Task>,
    pub events: Vec<TaskEvent>,
    pub artifacts: Vec<Artifact>,
    pub error: Option<LoadError>,
    /// `None` until the stream manager has been constructed.
    pub stream_status: Option<StreamStatus>,
    pub stream_enabled: bool,
}

enum Phase {
    Loading,
    Ready(Result<Timeline, LoadError>),
}

/// State machine behind the task detail view.
pub struct TaskDetailBinder {
    task_id: TaskId,
    token: MountToken,
    phase: Phase,
    /// Built on first enable only.
    stream: Option<StreamManager>,
    transport: Arc<dyn PushTransport>,
    base_url: String,
    inbox_tx: mpsc::UnboundedSender<StreamEventEnvelope>,
    inbox: mpsc::UnboundedReceiver<StreamEventEnvelope>,
    disposed: bool,
}

impl TaskDetailBinder {
    /// Mount the view for `task_id` in the Loading phase.
    ///
    /// The caller issues exactly one snapshot load for the returned binder and
    /// reports it through [`apply_snapshot`](Self::apply_snapshot).
    pub fn mount(task_id: TaskId, transport: Arc<dyn PushTransport>, base_url: &str) -> Self {
        let token = MountToken::next();
        let (inbox_tx, inbox) = mpsc::unbounded_channel();
        debug!(task_id = %task_id, token = ?token, "Mounted task detail");

        Self {
            task_id,
            token,
            phase: Phase::Loading,
            stream: None,
            transport,
            base_url: base_url.to_string(),
            inbox_tx,
            inbox,
            disposed: false,
        }
    }

    pub fn task_id(&self) -> &TaskId {
        &self.task_id
    }

    pub fn token(&self) -> MountToken {
        self.token
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.phase, Phase::Loading)
    }

    /// Apply the result of this mount's snapshot load.
    ///
    /// Returns false when the result was discarded: stale token, disposed
    /// binder, or a load already applied.
    pub fn apply_snapshot(&mut self, token: MountToken, result: Result<TaskSnapshot, LoadError>) -> bool {
        if self.disposed || token != self.token {
            debug!(task_id = %self.task_id, token = ?token, "Discarding superseded snapshot");
            return false;
        }
        if !self.is_loading() {
            debug!(task_id = %self.task_id, "Snapshot already applied");
            return false;
        }

        match result {
            Ok(snapshot) => {
                info!(
                    task_id = %self.task_id,
                    status = %snapshot.task.status,
                    events = snapshot.events.len(),
                    "Task snapshot loaded"
                );
                let timeline = Timeline::new(snapshot.task, snapshot.events, snapshot.artifacts);
                self.phase = Phase::Ready(Ok(timeline));
            }
            Err(e) => {
                warn!(task_id = %self.task_id, error = %e, "Task detail unavailable");
                self.phase = Phase::Ready(Err(e));
            }
        }

        self.evaluate_stream();
        true
    }

    fn timeline(&self) -> Option<&Timeline> {
        match &self.phase {
            Phase::Ready(Ok(timeline)) => Some(timeline),
            _ => None,
        }
    }

    /// Whether the stream should be running right now.
    pub fn stream_enabled(&self) -> bool {
        !self.disposed && self.timeline().is_some_and(|t| !t.is_terminal())
    }

    /// True while a push subscription is held.
    pub fn is_streaming(&self) -> bool {
        self.stream.as_ref().is_some_and(StreamManager::is_live)
    }

    fn evaluate_stream(&mut self) {
        let enabled = self.stream_enabled();

        if self.stream.is_none() {
            if !enabled {
                return;
            }
            let manager = StreamManager::new(self.transport.clone(), &self.base_url);
            let inbox = self.inbox_tx.clone();
            manager.set_handler(move |envelope| {
                let _ = inbox.send(envelope.clone());
            });
            self.stream = Some(manager);
        }

        if let Some(manager) = self.stream.as_mut() {
            manager.update(Some(&self.task_id), enabled);
        }
    }

    /// Wait for the next stream signal and fold what it delivered.
    ///
    /// Never completes while no subscription is live. Cancel-safe.
    pub async fn next_stream_activity(&mut self) {
        match self.stream.as_mut() {
            Some(manager) if manager.is_live() => {
                manager.pump().await;
            }
            _ => std::future::pending::<()>().await,
        }
        self.drain_inbox();
        self.evaluate_stream();
    }

    fn drain_inbox(&mut self) {
        while let Ok(envelope) = self.inbox.try_recv() {
            let event_id = envelope.event_id().clone();
            let Phase::Ready(Ok(timeline)) = &mut self.phase else {
                debug!(event_id = %event_id, "Dropping envelope without a timeline");
                continue;
            };

            match timeline.apply(envelope) {
                Reconciled::Appended { status_change: Some(change) } => {
                    info!(
                        task_id = %self.task_id,
                        from = %change.from,
                        to = %change.to,
                        "Task status changed"
                    );
                }
                Reconciled::Appended { status_change: None } => {
                    debug!(task_id = %self.task_id, event_id = %event_id, "Event appended");
                }
                Reconciled::Duplicate => {
                    debug!(task_id = %self.task_id, event_id = %event_id, "Duplicate event ignored");
                }
                Reconciled::ForeignTask { task_id } => {
                    warn!(
                        task_id = %self.task_id,
                        envelope_task = %task_id,
                        event_id = %event_id,
                        "Envelope for another task ignored"
                    );
                }
            }
        }
    }

    /// Current render state.
    pub fn snapshot(&self) -> DetailSnapshot {
        let (phase, task, events, artifacts, error) = match &self.phase {
            Phase::Loading => (DetailPhase::Loading, None, Vec::new(), Vec::new(), None),
            Phase::Ready(Ok(timeline)) => (
                DetailPhase::Ready,
                Some(timeline.task().clone()),
                timeline.events().to_vec(),
                timeline.artifacts().to_vec(),
                None,
            ),
            Phase::Ready(Err(e)) => (DetailPhase::Ready, None, Vec::new(), Vec::new(), Some(e.clone())),
        };

        DetailSnapshot {
            task_id: self.task_id.clone(),
            phase,
            task,
            events,
            artifacts,
            error,
            stream_status: self.stream.as_ref().map(StreamManager::status),
            stream_enabled: self.stream_enabled(),
        }
    }

    /// Tear the view down: close the subscription and ignore any later load
    /// result or queued envelope.
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.disposed = true;
        if let Some(manager) = self.stream.as_mut() {
            manager.handler().clear();
            manager.update(Some(&self.task_id), false);
        }
        self.inbox.close();
        while self.inbox.try_recv().is_ok() {}
        debug!(task_id = %self.task_id, "Disposed task detail");
    }
}

impl Drop for TaskDetailBinder {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::SnapshotLoader;
    use crate::testing::{envelope_json, message, snapshot, transition_json, FakeTaskApi, ScriptedTransport};
    use crate::transport::TransportSignal;
    use taskscope_core::TaskStatus;

    const BASE: &str = "http://gw";

    async fn mount_loaded(
        api: &Arc<FakeTaskApi>,
        transport: &ScriptedTransport,
        task_id: &str,
    ) -> TaskDetailBinder {
        let loader = SnapshotLoader::new(api.clone());
        let mut binder = TaskDetailBinder::mount(TaskId::from(task_id), Arc::new(transport.clone()), BASE);
        let result = loader.load(binder.task_id()).await;
        assert!(binder.apply_snapshot(binder.token(), result));
        binder
    }

    fn event_ids(view: &DetailSnapshot) -> Vec<String> {
        view.events.iter().map(|e| e.event_id.to_string()).collect()
    }

    #[test]
    fn test_mount_starts_loading_without_stream() {
        let transport = ScriptedTransport::new();
        let binder = TaskDetailBinder::mount(TaskId::from("t1"), Arc::new(transport.clone()), BASE);

        let view = binder.snapshot();
        assert_eq!(view.phase, DetailPhase::Loading);
        assert!(view.task.is_none());
        assert!(view.stream_status.is_none());
        assert!(transport.opened().is_empty());
    }

    #[tokio::test]
    async fn test_running_task_streams_until_final_transition() {
        let api = Arc::new(FakeTaskApi::new().with_task(snapshot("t1", TaskStatus::Running, &["e1", "e2"])));
        let transport = ScriptedTransport::new();
        transport.script(vec![
            TransportSignal::Open,
            message("STATE_TRANSITION", &transition_json("t1", "e3", 3, "SUCCEEDED", true)),
        ]);

        let mut binder = mount_loaded(&api, &transport, "t1").await;
        let view = binder.snapshot();
        assert!(view.stream_enabled);
        assert_eq!(view.stream_status, Some(StreamStatus::Connecting));
        assert_eq!(transport.opened(), vec!["http://gw/api/stream/task/t1"]);

        binder.next_stream_activity().await;
        assert_eq!(binder.snapshot().stream_status, Some(StreamStatus::Connected));

        binder.next_stream_activity().await;
        let view = binder.snapshot();
        assert_eq!(view.task.as_ref().map(|t| t.status), Some(TaskStatus::Succeeded));
        assert_eq!(event_ids(&view), vec!["e1", "e2", "e3"]);
        assert_eq!(view.stream_status, Some(StreamStatus::Closed));
        assert!(!view.stream_enabled);
        assert!(!binder.is_streaming());
        assert_eq!(transport.live(), 0);
    }

    #[tokio::test]
    async fn test_terminal_transition_without_final_disables_stream() {
        let api = Arc::new(FakeTaskApi::new().with_task(snapshot("t1", TaskStatus::Running, &[])));
        let transport = ScriptedTransport::new();
        transport.script(vec![message("STATE_TRANSITION", &transition_json("t1", "e1", 1, "FAILED", false))]);

        let mut binder = mount_loaded(&api, &transport, "t1").await;
        binder.next_stream_activity().await;

        let view = binder.snapshot();
        assert_eq!(view.task.map(|t| t.status), Some(TaskStatus::Failed));
        assert!(!view.stream_enabled);
        assert_eq!(view.stream_status, Some(StreamStatus::Disconnected));
        assert_eq!(transport.closed(), 1);
    }

    #[tokio::test]
    async fn test_terminal_snapshot_never_builds_stream() {
        let api = Arc::new(FakeTaskApi::new().with_task(snapshot("t1", TaskStatus::Succeeded, &["e1"])));
        let transport = ScriptedTransport::new();

        let binder = mount_loaded(&api, &transport, "t1").await;

        let view = binder.snapshot();
        assert_eq!(view.phase, DetailPhase::Ready);
        assert!(view.stream_status.is_none());
        assert!(!view.stream_enabled);
        assert!(transport.opened().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_delivery_is_kept_once() {
        let api = Arc::new(FakeTaskApi::new().with_task(snapshot("t1", TaskStatus::Running, &["e1"])));
        let transport = ScriptedTransport::new();
        transport.script(vec![
            message("USER_MESSAGE", &envelope_json("t1", "e1", 1, false)),
            message("USER_MESSAGE", &envelope_json("t1", "e2", 2, false)),
            message("USER_MESSAGE", &envelope_json("t1", "e2", 2, false)),
        ]);

        let mut binder = mount_loaded(&api, &transport, "t1").await;
        for _ in 0..3 {
            binder.next_stream_activity().await;
        }

        assert_eq!(event_ids(&binder.snapshot()), vec!["e1", "e2"]);
    }

    #[tokio::test]
    async fn test_not_found_renders_error_without_stream() {
        let api = Arc::new(FakeTaskApi::new());
        let transport = ScriptedTransport::new();

        let binder = mount_loaded(&api, &transport, "missing").await;

        let view = binder.snapshot();
        assert_eq!(view.phase, DetailPhase::Ready);
        assert!(view.error.as_ref().is_some_and(LoadError::is_not_found));
        assert!(view.stream_status.is_none());
        assert!(transport.opened().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_rendered_inline() {
        let transport = ScriptedTransport::new();
        let mut binder = TaskDetailBinder::mount(TaskId::from("t1"), Arc::new(transport.clone()), BASE);

        binder.apply_snapshot(binder.token(), Err(LoadError::Transport("HTTP 502".to_string())));

        let view = binder.snapshot();
        assert_eq!(view.error, Some(LoadError::Transport("HTTP 502".to_string())));
        assert!(!view.stream_enabled);
    }

    #[tokio::test]
    async fn test_navigation_closes_previous_stream_first() {
        let api = Arc::new(
            FakeTaskApi::new()
                .with_task(snapshot("a", TaskStatus::Running, &["a1"]))
                .with_task(snapshot("b", TaskStatus::Running, &["b1"])),
        );
        let transport = ScriptedTransport::new();
        transport.script(vec![
            TransportSignal::Open,
            message("USER_MESSAGE", &envelope_json("a", "a2", 2, false)),
        ]);

        let mut a = mount_loaded(&api, &transport, "a").await;
        a.next_stream_activity().await;
        assert_eq!(transport.live(), 1);

        a.dispose();
        assert_eq!(transport.live(), 0);
        assert_eq!(api.requests.lock().unwrap().len(), 1);

        let b = mount_loaded(&api, &transport, "b").await;
        assert_eq!(api.requests.lock().unwrap().len(), 2);
        assert_eq!(transport.closed(), 1);
        assert_eq!(event_ids(&b.snapshot()), vec!["b1"]);
        assert_eq!(
            transport.opened(),
            vec!["http://gw/api/stream/task/a", "http://gw/api/stream/task/b"]
        );
    }

    #[tokio::test]
    async fn test_stale_or_late_loads_are_discarded() {
        let api = Arc::new(FakeTaskApi::new().with_task(snapshot("a", TaskStatus::Running, &["a1"])));
        let loader = SnapshotLoader::new(api.clone());
        let transport = ScriptedTransport::new();

        let mut a = TaskDetailBinder::mount(TaskId::from("a"), Arc::new(transport.clone()), BASE);
        let a_token = a.token();
        let mut b = TaskDetailBinder::mount(TaskId::from("b"), Arc::new(transport.clone()), BASE);

        let a_result = loader.load(a.task_id()).await;
        assert!(!b.apply_snapshot(a_token, a_result.clone()));
        assert!(b.is_loading());

        a.dispose();
        assert!(!a.apply_snapshot(a_token, a_result));
        assert!(a.is_loading());
        assert!(transport.opened().is_empty());
    }

    #[tokio::test]
    async fn test_second_load_result_is_ignored() {
        let api = Arc::new(FakeTaskApi::new().with_task(snapshot("t1", TaskStatus::Succeeded, &["e1"])));
        let transport = ScriptedTransport::new();
        let mut binder = mount_loaded(&api, &transport, "t1").await;

        let again = Ok(snapshot("t1", TaskStatus::Running, &[]));
        assert!(!binder.apply_snapshot(binder.token(), again));
        assert_eq!(binder.snapshot().task.map(|t| t.status), Some(TaskStatus::Succeeded));
    }

    #[tokio::test]
    async fn test_foreign_envelope_does_not_touch_state() {
        let api = Arc::new(FakeTaskApi::new().with_task(snapshot("t1", TaskStatus::Running, &["e1"])));
        let transport = ScriptedTransport::new();
        transport.script(vec![message("STATE_TRANSITION", &transition_json("other", "x1", 9, "FAILED", false))]);

        let mut binder = mount_loaded(&api, &transport, "t1").await;
        binder.next_stream_activity().await;

        let view = binder.snapshot();
        assert_eq!(view.task.as_ref().map(|t| t.status), Some(TaskStatus::Running));
        assert_eq!(event_ids(&view), vec!["e1"]);
        assert!(view.stream_enabled);
    }
}
