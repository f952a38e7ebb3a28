//! TaskScope Core Domain Types
//!
//! This crate contains the client-side view of server-authoritative task state,
//! with no dependencies on:
//! - Network/HTTP
//! - Terminal rendering
//! - Runtime specifics
//!
//! The [`reconcile`] module holds the merge logic that folds streamed events
//! into a snapshot-loaded timeline.

pub mod artifact;
pub mod error;
pub mod event;
pub mod ids;
pub mod reconcile;
pub mod status;
pub mod task;

// Re-export commonly used types
pub use artifact::{Artifact, ArtifactPart, PartType};
pub use error::CoreError;
pub use event::{EventPayload, StreamEventEnvelope, TaskEvent};
pub use ids::{ArtifactId, EventId, TaskId};
pub use reconcile::{derive_status, reconcile, Reconciled, StatusChange, Timeline};
pub use status::{EventType, RiskLevel, TaskStatus};
pub use task::{RequesterInfo, Task, TaskSummary};
