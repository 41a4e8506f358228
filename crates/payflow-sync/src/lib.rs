//! PayFlow Sync - Offline-first write path
//!
//! Provides:
//! - Classification of failures into connectivity vs. application errors
//! - An online/offline notification source with a reachability probe
//! - The sync engine: cache fallback for reads, optimistic writes with a
//!   persisted mutation queue, and ordered replay on reconnect
//!
//! ## Modules
//!
//! - [`classifier`] - Network error classification
//! - [`connectivity`] - Connectivity monitor (`IConnectivity` implementation)
//! - [`engine`] - Sync engine orchestrating reads, writes and queue drains

pub mod classifier;
pub mod connectivity;
pub mod engine;

pub use classifier::NetworkClassifier;
pub use connectivity::ConnectivityMonitor;
pub use engine::{
    CreateOutcome, DeleteOutcome, FlushReport, ListOutcome, ListSource, SyncEngine, UpdateOutcome,
};

use thiserror::Error;

/// Errors that can occur while reconciling server responses
#[derive(Debug, Error)]
pub enum SyncError {
    /// The server accepted a write but its response is not a debt record
    #[error("Unexpected server response: {0}")]
    UnexpectedResponse(String),

    /// A queued mutation is missing the identifier its kind requires
    #[error("Malformed queued mutation: {0}")]
    MalformedMutation(String),
}
