//! TaskScope client.
//!
//! Talks to the task gateway and keeps a task's detail view in sync:
//! - [`HttpClient`]: REST access to the task list and task snapshots
//! - [`HttpEventSource`]: server-sent events push transport
//! - [`StreamManager`]: push subscription lifecycle and connection status
//! - [`TaskDetailBinder`]: snapshot + stream + reconciler state machine

pub mod api;
pub mod binder;
pub mod config;
pub mod error;
pub mod http;
pub mod snapshot;
pub mod sse;
pub mod stream;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use api::{TaskApi, TaskListResponse, TaskSnapshot};
pub use binder::{DetailPhase, DetailSnapshot, MountToken, TaskDetailBinder};
pub use config::ClientConfig;
pub use error::ClientError;
pub use http::HttpClient;
pub use snapshot::{LoadError, SnapshotLoader};
pub use sse::{SseDecoder, SseFrame};
pub use stream::{HandlerSlot, StreamManager, StreamStatus};
pub use transport::{HttpEventSource, PushTransport, Subscription, TransportSignal};
