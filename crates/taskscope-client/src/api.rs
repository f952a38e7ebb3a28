//! Request/response capability for the task gateway's REST endpoints.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use taskscope_core::{Artifact, Task, TaskEvent, TaskId, TaskStatus, TaskSummary};

use crate::error::ClientError;

/// Response of `GET /api/tasks`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskListResponse {
    pub tasks: Vec<TaskSummary>,
}

/// Point-in-time task detail: response of `GET /api/tasks/{id}`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskSnapshot {
    pub task: Task,
    /// Events in server order.
    #[serde(default)]
    pub events: Vec<TaskEvent>,
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
}

/// Black-box access to the task gateway.
///
/// Implemented over HTTP by [`crate::HttpClient`]; tests substitute fakes.
#[async_trait]
pub trait TaskApi: Send + Sync {
    /// List tasks, optionally filtered by status.
    async fn list_tasks(&self, status: Option<TaskStatus>) -> Result<Vec<TaskSummary>, ClientError>;

    /// Fetch the detail snapshot of one task.
    async fn get_task(&self, task_id: &TaskId) -> Result<TaskSnapshot, ClientError>;
}
