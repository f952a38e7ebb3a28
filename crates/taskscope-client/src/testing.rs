//! Test doubles for the transport and the REST API.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;

use taskscope_core::{RequesterInfo, RiskLevel, Task, TaskEvent, TaskId, TaskStatus, TaskSummary};

use crate::api::{TaskApi, TaskSnapshot};
use crate::error::ClientError;
use crate::transport::{PushTransport, Subscription, TransportSignal};

/// A message signal on `event` carrying `data`.
pub fn message(event: &str, data: &str) -> TransportSignal {
    TransportSignal::Message {
        event: event.to_string(),
        data: data.to_string(),
    }
}

/// JSON for a USER_MESSAGE envelope.
pub fn envelope_json(task_id: &str, event_id: &str, seq: u64, is_final: bool) -> String {
    json!({
        "event_id": event_id,
        "task_id": task_id,
        "task_seq": seq,
        "ts": "2026-03-01T10:00:00Z",
        "type": "USER_MESSAGE",
        "actor": "user",
        "payload": { "text_preview": "hello" },
        "final": is_final,
    })
    .to_string()
}

/// JSON for a STATE_TRANSITION envelope.
pub fn transition_json(task_id: &str, event_id: &str, seq: u64, to: &str, is_final: bool) -> String {
    json!({
        "event_id": event_id,
        "task_id": task_id,
        "task_seq": seq,
        "ts": "2026-03-01T10:00:05Z",
        "type": "STATE_TRANSITION",
        "actor": "system",
        "payload": { "from_status": "RUNNING", "to_status": to },
        "final": is_final,
    })
    .to_string()
}

pub fn task(task_id: &str, status: TaskStatus) -> Task {
    let ts = Utc.with_ymd_and_hms(2026, 3, 1, 10, 0, 0).unwrap();
    Task {
        task_id: TaskId::from(task_id),
        created_at: ts,
        updated_at: ts,
        status,
        title: format!("task {}", task_id),
        thread_id: "thread-1".to_string(),
        scope_id: "scope-1".to_string(),
        requester: RequesterInfo {
            channel: "web".to_string(),
            sender_id: "owner".to_string(),
        },
        risk_level: RiskLevel::Low,
    }
}

pub fn event(event_id: &str, seq: u64) -> TaskEvent {
    serde_json::from_str(&envelope_json("any", event_id, seq, false)).unwrap()
}

pub fn snapshot(task_id: &str, status: TaskStatus, event_ids: &[&str]) -> TaskSnapshot {
    TaskSnapshot {
        task: task(task_id, status),
        events: event_ids
            .iter()
            .enumerate()
            .map(|(i, id)| event(id, i as u64 + 1))
            .collect(),
        artifacts: Vec::new(),
    }
}

#[derive(Default)]
struct Script {
    signals: VecDeque<TransportSignal>,
    /// Report the subscription as ended once the signals run out.
    ends: bool,
}

#[derive(Default)]
struct TransportState {
    scripts: VecDeque<Script>,
    opened: Vec<String>,
    closed: usize,
}

/// Push transport that replays scripted signals.
///
/// Each `open` consumes the next queued script. A subscription whose script
/// is exhausted stays pending like an idle stream, unless it was scripted to
/// end.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    state: Arc<Mutex<TransportState>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue signals for the next subscription.
    pub fn script(&self, signals: Vec<TransportSignal>) {
        self.push_script(signals, false);
    }

    /// Queue signals for the next subscription, which then ends.
    pub fn script_then_end(&self, signals: Vec<TransportSignal>) {
        self.push_script(signals, true);
    }

    fn push_script(&self, signals: Vec<TransportSignal>, ends: bool) {
        self.state.lock().unwrap().scripts.push_back(Script {
            signals: signals.into(),
            ends,
        });
    }

    /// URLs of every subscription opened so far.
    pub fn opened(&self) -> Vec<String> {
        self.state.lock().unwrap().opened.clone()
    }

    /// Number of subscriptions closed so far.
    pub fn closed(&self) -> usize {
        self.state.lock().unwrap().closed
    }

    /// Number of subscriptions currently open.
    pub fn live(&self) -> usize {
        let state = self.state.lock().unwrap();
        state.opened.len() - state.closed
    }
}

impl PushTransport for ScriptedTransport {
    fn open(&self, url: &str) -> Box<dyn Subscription> {
        let mut state = self.state.lock().unwrap();
        state.opened.push(url.to_string());
        let script = state.scripts.pop_front().unwrap_or_default();
        Box::new(ScriptedSubscription {
            script,
            state: self.state.clone(),
            closed: false,
        })
    }
}

struct ScriptedSubscription {
    script: Script,
    state: Arc<Mutex<TransportState>>,
    closed: bool,
}

#[async_trait]
impl Subscription for ScriptedSubscription {
    async fn next_signal(&mut self) -> Option<TransportSignal> {
        if self.closed {
            return None;
        }
        match self.script.signals.pop_front() {
            Some(signal) => Some(signal),
            None if self.script.ends => None,
            None => std::future::pending().await,
        }
    }

    fn close(&mut self) {
        if !self.closed {
            self.closed = true;
            self.state.lock().unwrap().closed += 1;
        }
    }
}

/// In-memory task API.
#[derive(Default)]
pub struct FakeTaskApi {
    tasks: HashMap<TaskId, TaskSnapshot>,
    /// Task ids passed to `get_task`, in call order.
    pub requests: Mutex<Vec<TaskId>>,
}

impl FakeTaskApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_task(mut self, snapshot: TaskSnapshot) -> Self {
        self.tasks.insert(snapshot.task.task_id.clone(), snapshot);
        self
    }
}

#[async_trait]
impl TaskApi for FakeTaskApi {
    async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<TaskSummary>, ClientError> {
        let mut tasks: Vec<TaskSummary> = self
            .tasks
            .values()
            .map(|s| s.task.summary())
            .filter(|t| status.map_or(true, |s| t.status == s))
            .collect();
        tasks.sort_by(|a, b| a.task_id.cmp(&b.task_id));
        Ok(tasks)
    }

    async fn get_task(&self, task_id: &TaskId) -> Result<TaskSnapshot, ClientError> {
        self.requests.lock().unwrap().push(task_id.clone());
        self.tasks
            .get(task_id)
            .cloned()
            .ok_or_else(|| ClientError::from_response_parts(404, br#"{"error":{"code":"TASK_NOT_FOUND","message":"Task not found"}}"#))
    }
}
