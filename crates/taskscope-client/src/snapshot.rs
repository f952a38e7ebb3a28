//! Snapshot loading.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, warn};

use taskscope_core::TaskId;

use crate::api::{TaskApi, TaskSnapshot};
use crate::error::ClientError;

/// Why a snapshot could not be loaded. `Display` is the text shown inline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Transport(String),
}

impl LoadError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, LoadError::NotFound(_))
    }
}

impl From<ClientError> for LoadError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::NotFound(message) => LoadError::NotFound(message),
            other => LoadError::Transport(other.to_string()),
        }
    }
}

/// Fetches the point-in-time state of one task.
#[derive(Clone)]
pub struct SnapshotLoader {
    api: Arc<dyn TaskApi>,
}

impl SnapshotLoader {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }

    /// Load task metadata, events in server order, and artifacts.
    pub async fn load(&self, task_id: &TaskId) -> Result<TaskSnapshot, LoadError> {
        debug!(task_id = %task_id, "Loading task snapshot");

        match self.api.get_task(task_id).await {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                warn!(task_id = %task_id, error = %e, "Task snapshot load failed");
                Err(e.into())
            }
        }
    }
}
