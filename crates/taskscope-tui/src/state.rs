//! UI state for rendering.

use taskscope_client::DetailSnapshot;
use taskscope_core::{TaskId, TaskStatus, TaskSummary};

/// Available views in the TUI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum View {
    #[default]
    Tasks,
    Detail,
}

/// Statuses the list filter cycles through after "all".
const FILTER_CYCLE: [TaskStatus; 5] = [
    TaskStatus::Created,
    TaskStatus::Running,
    TaskStatus::Succeeded,
    TaskStatus::Failed,
    TaskStatus::Cancelled,
];

/// Next list filter: all, then each common status, then all again.
pub fn next_filter(current: Option<TaskStatus>) -> Option<TaskStatus> {
    match current {
        None => Some(FILTER_CYCLE[0]),
        Some(status) => FILTER_CYCLE
            .iter()
            .position(|s| *s == status)
            .and_then(|i| FILTER_CYCLE.get(i + 1))
            .copied(),
    }
}

/// Snapshot of data for rendering (no async, no locks).
#[derive(Default)]
pub struct UiState {
    /// Task list from the gateway.
    pub tasks: Vec<TaskSummary>,

    /// Selected row in the task list.
    pub selected_task_index: usize,

    /// Active list filter.
    pub status_filter: Option<TaskStatus>,

    /// Current view.
    pub current_view: View,

    /// Task whose detail is on screen.
    pub viewing: Option<TaskId>,

    /// Latest render state of the open task.
    pub detail: Option<DetailSnapshot>,

    /// Scroll offset in the detail timeline.
    pub detail_scroll: usize,

    /// Last task list error (if any).
    pub list_error: Option<String>,

    /// Gateway health, once checked.
    pub gateway_healthy: Option<bool>,

    /// Backend failed to start.
    pub fatal_error: Option<String>,
}

impl UiState {
    pub fn selected_task(&self) -> Option<&TaskSummary> {
        self.tasks.get(self.selected_task_index)
    }

    pub fn select_next_task(&mut self) {
        if !self.tasks.is_empty() {
            self.selected_task_index = (self.selected_task_index + 1).min(self.tasks.len() - 1);
        }
    }

    pub fn select_prev_task(&mut self) {
        self.selected_task_index = self.selected_task_index.saturating_sub(1);
    }

    /// Replace the task list, keeping the selection on the same task if it is
    /// still listed.
    pub fn set_tasks(&mut self, tasks: Vec<TaskSummary>) {
        let selected = self.selected_task().map(|t| t.task_id.clone());
        self.tasks = tasks;
        self.selected_task_index = selected
            .and_then(|id| self.tasks.iter().position(|t| t.task_id == id))
            .unwrap_or_else(|| self.selected_task_index.min(self.tasks.len().saturating_sub(1)));
        self.list_error = None;
    }

    /// Switch to the detail view of `task_id`.
    pub fn open_task(&mut self, task_id: TaskId) {
        self.viewing = Some(task_id);
        self.detail = None;
        self.detail_scroll = 0;
        self.current_view = View::Detail;
    }

    pub fn close_task(&mut self) {
        self.viewing = None;
        self.detail = None;
        self.current_view = View::Tasks;
    }

    /// Accept a detail update if it belongs to the task on screen.
    pub fn apply_detail(&mut self, snapshot: DetailSnapshot) -> bool {
        if self.viewing.as_ref() != Some(&snapshot.task_id) {
            return false;
        }
        self.detail = Some(snapshot);
        true
    }
}
