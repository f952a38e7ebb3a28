//! Stream connection manager.
//!
//! Owns at most one push subscription for a `(task id, enabled)` pair, tracks
//! its connection status and hands parsed envelopes to the registered
//! handler. The manager is driven from a single event loop: the owner calls
//! [`StreamManager::update`] whenever its inputs change and awaits
//! [`StreamManager::pump`] to receive the next signal.

use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tracing::{debug, info};

use taskscope_core::{EventType, StreamEventEnvelope, TaskId};

use crate::sse::DEFAULT_EVENT;
use crate::transport::{PushTransport, Subscription, TransportSignal};

/// Connection status of the push stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StreamStatus {
    /// Subscription requested, not yet confirmed open.
    Connecting,
    /// Transport confirmed the connection.
    Connected,
    /// Recoverable failure; the transport retries by itself.
    #[default]
    Disconnected,
    /// Closed for good, by the transport or after a final envelope.
    Closed,
}

impl StreamStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamStatus::Connecting => "connecting",
            StreamStatus::Connected => "connected",
            StreamStatus::Disconnected => "disconnected",
            StreamStatus::Closed => "closed",
        }
    }
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type Handler = Box<dyn FnMut(&StreamEventEnvelope) + Send>;

#[derive(Default)]
struct SlotState {
    handler: Option<Handler>,
    /// Bumped on every `set` and `clear`.
    generation: u64,
    /// Generation of the handler currently running outside the slot.
    running: Option<u64>,
}

/// One-slot holder for the envelope handler.
///
/// Clones share the slot, so replacing the handler takes effect for an
/// already-open subscription. The handler runs outside the slot lock and may
/// itself call [`set`](Self::set) or [`clear`](Self::clear) on a clone.
#[derive(Clone, Default)]
pub struct HandlerSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl HandlerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the current handler.
    pub fn set(&self, handler: impl FnMut(&StreamEventEnvelope) + Send + 'static) {
        let mut state = self.lock();
        state.handler = Some(Box::new(handler));
        state.generation += 1;
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.handler = None;
        state.generation += 1;
    }

    pub fn is_set(&self) -> bool {
        let state = self.lock();
        state.handler.is_some() || state.running == Some(state.generation)
    }

    /// Call the current handler. Returns false when the slot is empty.
    ///
    /// The handler is put back afterwards unless it was replaced or cleared
    /// while running.
    fn invoke(&self, envelope: &StreamEventEnvelope) -> bool {
        let (mut handler, generation) = {
            let mut state = self.lock();
            let Some(handler) = state.handler.take() else {
                return false;
            };
            state.running = Some(state.generation);
            (handler, state.generation)
        };

        handler(envelope);

        let mut state = self.lock();
        state.running = None;
        if state.generation == generation {
            state.handler = Some(handler);
        }
        true
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl fmt::Debug for HandlerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSlot")
            .field("set", &self.is_set())
            .finish()
    }
}

/// Manages the push subscription for one view.
pub struct StreamManager {
    transport: Arc<dyn PushTransport>,
    base_url: String,
    /// Last `(task id, enabled)` pair passed to [`update`](Self::update).
    key: Option<(Option<TaskId>, bool)>,
    subscription: Option<Box<dyn Subscription>>,
    task_id: Option<TaskId>,
    status: watch::Sender<StreamStatus>,
    handler: HandlerSlot,
}

impl StreamManager {
    pub fn new(transport: Arc<dyn PushTransport>, base_url: &str) -> Self {
        let (status, _) = watch::channel(StreamStatus::default());
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            key: None,
            subscription: None,
            task_id: None,
            status,
            handler: HandlerSlot::new(),
        }
    }

    /// Shared handler slot.
    pub fn handler(&self) -> &HandlerSlot {
        &self.handler
    }

    /// Register the envelope handler, replacing any previous one.
    pub fn set_handler(&self, handler: impl FnMut(&StreamEventEnvelope) + Send + 'static) {
        self.handler.set(handler);
    }

    /// Current connection status.
    pub fn status(&self) -> StreamStatus {
        *self.status.borrow()
    }

    /// Watch status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<StreamStatus> {
        self.status.subscribe()
    }

    /// True while a subscription is held.
    pub fn is_live(&self) -> bool {
        self.subscription.is_some()
    }

    /// Push-stream URL for a task.
    pub fn stream_url(&self, task_id: &TaskId) -> String {
        format!("{}/api/stream/task/{}", self.base_url, task_id)
    }

    /// Reconcile the subscription with the given inputs.
    ///
    /// Only a change of the `(task_id, enabled)` pair has an effect. Any
    /// change closes the current subscription first; a new one is opened when
    /// enabled with an id present. Disabling keeps a `Closed` status only
    /// while the task id is unchanged.
    pub fn update(&mut self, task_id: Option<&TaskId>, enabled: bool) {
        let key = (task_id.cloned(), enabled);
        if self.key.as_ref() == Some(&key) {
            return;
        }
        let same_task = self
            .key
            .as_ref()
            .is_some_and(|(previous, _)| previous.as_ref() == task_id);
        self.key = Some(key);

        self.teardown();

        match task_id {
            Some(task_id) if enabled => self.open(task_id),
            // A stream that closed itself stays closed for its own task only.
            _ if same_task && self.status() == StreamStatus::Closed => {}
            _ => self.set_status(StreamStatus::Disconnected),
        }
    }

    fn open(&mut self, task_id: &TaskId) {
        let url = self.stream_url(task_id);
        info!(task_id = %task_id, url = %url, "Subscribing to task stream");

        self.subscription = Some(self.transport.open(&url));
        self.task_id = Some(task_id.clone());
        self.set_status(StreamStatus::Connecting);
    }

    fn teardown(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.close();
            if let Some(task_id) = self.task_id.take() {
                debug!(task_id = %task_id, "Closed task stream");
            }
        }
    }

    fn set_status(&self, status: StreamStatus) {
        let previous = self.status.send_replace(status);
        if previous != status {
            debug!(from = %previous, to = %status, "Stream status changed");
        }
    }

    /// Wait for the next transport signal and handle it.
    ///
    /// Returns false without waiting when no subscription is live. Cancel-safe.
    pub async fn pump(&mut self) -> bool {
        let signal = match self.subscription.as_mut() {
            Some(subscription) => subscription.next_signal().await,
            None => return false,
        };

        match signal {
            Some(signal) => {
                self.dispatch(signal);
            }
            None => {
                self.teardown();
                self.set_status(StreamStatus::Closed);
            }
        }
        true
    }

    /// Handle one transport signal. Returns true when the handler was invoked.
    ///
    /// Signals arriving without a live subscription are dropped.
    pub fn dispatch(&mut self, signal: TransportSignal) -> bool {
        if !self.is_live() {
            debug!(?signal, "Dropping signal for closed stream");
            return false;
        }

        match signal {
            TransportSignal::Open => {
                self.set_status(StreamStatus::Connected);
                false
            }
            TransportSignal::Error { closed: true } => {
                self.teardown();
                self.set_status(StreamStatus::Closed);
                false
            }
            TransportSignal::Error { closed: false } => {
                self.set_status(StreamStatus::Disconnected);
                false
            }
            TransportSignal::Message { event, data } => self.on_message(&event, &data),
        }
    }

    fn on_message(&mut self, event: &str, data: &str) -> bool {
        if event != DEFAULT_EVENT && EventType::from_str(event).is_err() {
            debug!(event = %event, "Ignoring frame on unknown channel");
            return false;
        }

        let envelope: StreamEventEnvelope = match serde_json::from_str(data) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!(event = %event, error = %e, "Discarding unparseable frame");
                return false;
            }
        };

        let invoked = self.handler.invoke(&envelope);

        if envelope.is_final {
            info!(task_id = %envelope.task_id, "Final event received, closing stream");
            self.teardown();
            self.set_status(StreamStatus::Closed);
        }

        invoked
    }
}

impl Drop for StreamManager {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl fmt::Debug for StreamManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamManager")
            .field("base_url", &self.base_url)
            .field("key", &self.key)
            .field("live", &self.is_live())
            .field("status", &self.status())
            .finish()
    }
}
