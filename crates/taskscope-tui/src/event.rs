//! Event types for communication between the backend and the UI.

use taskscope_client::DetailSnapshot;
use taskscope_core::{TaskId, TaskStatus, TaskSummary};

/// Events sent from the backend to the UI thread.
#[derive(Debug)]
pub enum UiEvent {
    /// Task list was refreshed.
    TasksUpdated(Vec<TaskSummary>),

    /// Task list could not be fetched.
    TaskListError(String),

    /// New render state of the open task.
    DetailUpdated(DetailSnapshot),

    /// Result of the gateway health check.
    Health(bool),

    /// The backend could not start.
    Fatal(String),
}

/// Commands sent from the UI to the backend.
#[derive(Debug)]
pub enum BackendCommand {
    /// Refresh the task list now.
    RefreshTasks,

    /// Change the list filter and refresh.
    SetStatusFilter(Option<TaskStatus>),

    /// Open a task's detail view, closing any other.
    OpenTask(TaskId),

    /// Close the detail view and go back to the list.
    CloseTask,

    /// Quit the application.
    Quit,
}
