//! Local key-value storage port (driven/secondary port)
//!
//! Values are opaque text; callers serialize their own structures. Uses
//! `anyhow::Result` because storage errors are adapter-specific (SQLite,
//! in-memory, ...).

/// Port trait for persistent key-value storage surviving restarts
#[async_trait::async_trait]
pub trait IKeyValueStore: Send + Sync {
    /// Returns the stored text for `key`, or `None` if nothing was stored
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value
    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;
}
