//! Error types for the TaskScope client.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when talking to the task gateway.
///
/// `Display` is the single human-readable message shown to the user.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The gateway answered 404.
    #[error("{0}")]
    NotFound(String),

    /// Non-2xx answer other than 404.
    #[error("{message}")]
    Status { status: u16, message: String },

    /// Network or protocol failure below HTTP semantics.
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Client could not be built from its configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl ClientError {
    /// Build the error for a non-2xx response from its status and body.
    ///
    /// The message comes from the gateway's `{ "error": { "message" } }`
    /// envelope when present, otherwise falls back to `HTTP <status>`.
    pub fn from_response_parts(status: u16, body: &[u8]) -> Self {
        let message = serde_json::from_slice::<ErrorEnvelope>(body)
            .ok()
            .map(|envelope| envelope.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| format!("HTTP {}", status));

        if status == 404 {
            ClientError::NotFound(message)
        } else {
            ClientError::Status { status, message }
        }
    }

    /// Returns true for a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::NotFound(_))
    }
}

/// Gateway error envelope.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
}
