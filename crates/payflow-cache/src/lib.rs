//! PayFlow Cache - Local state persistence
//!
//! Keeps the two pieces of client state that must survive restarts:
//! - The last known debt list (cache snapshot)
//! - Writes that could not reach the server (pending-mutation queue)
//!
//! ## Architecture
//!
//! The storage adapters implement the `IKeyValueStore` port from
//! `payflow-core`; [`CacheManager`] and [`MutationQueue`] layer typed,
//! JSON-serialized access on top of any such store.
//!
//! ## Key Components
//!
//! - [`DatabasePool`] - SQLite connection pool with migration support
//! - [`SqliteKeyValueStore`] - Durable `IKeyValueStore` implementation
//! - [`MemoryKeyValueStore`] - In-process `IKeyValueStore` for tests
//! - [`CacheManager`] - Cache snapshot read/write/transform
//! - [`MutationQueue`] - FIFO queue of pending mutations
//!
//! ## Usage
//!
//! ```no_run
//! use std::{path::Path, sync::Arc};
//! use payflow_cache::{CacheManager, DatabasePool, SqliteKeyValueStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let pool = DatabasePool::new(Path::new("/home/user/.local/share/payflow/payflow.db")).await?;
//! let store = Arc::new(SqliteKeyValueStore::new(pool.pool().clone()));
//! let cache = CacheManager::new(store, "payflow:debts-cache");
//! let snapshot = cache.read().await?;
//! println!("{} cached debts", snapshot.data.len());
//! # Ok(())
//! # }
//! ```

pub mod memory;
pub mod pool;
pub mod queue;
pub mod snapshot;
pub mod store;

pub use memory::MemoryKeyValueStore;
pub use pool::DatabasePool;
pub use queue::MutationQueue;
pub use snapshot::CacheManager;
pub use store::SqliteKeyValueStore;

/// Errors that can occur during cache operations
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Failed to establish a database connection
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// A database query failed
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Schema migration failed
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Serialization of a snapshot or queue failed
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<sqlx::Error> for CacheError {
    fn from(e: sqlx::Error) -> Self {
        CacheError::QueryFailed(e.to_string())
    }
}

impl From<serde_json::Error> for CacheError {
    fn from(e: serde_json::Error) -> Self {
        CacheError::SerializationError(e.to_string())
    }
}
