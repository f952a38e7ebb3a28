//! Core domain errors.

use thiserror::Error;

/// Core domain errors for TaskScope.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// Unknown task status string.
    #[error("Invalid task status: {0}")]
    InvalidStatus(String),

    /// Unknown event type string.
    #[error("Invalid event type: {0}")]
    InvalidEventType(String),
}
