//! Persisted FIFO queue of pending mutations
//!
//! The whole queue is stored as one JSON array under a single key. Every
//! operation reads the current array, edits an owned copy and writes it
//! back; there is no partial update.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use tracing::{debug, warn};

use payflow_core::domain::PendingMutation;
use payflow_core::ports::IKeyValueStore;

use crate::CacheError;

/// Ordered list of writes waiting for replay
pub struct MutationQueue {
    store: Arc<dyn IKeyValueStore>,
    key: String,
}

impl MutationQueue {
    pub fn new(store: Arc<dyn IKeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Appends a mutation, stamping `queued_at` with the current time
    pub async fn enqueue(&self, mut mutation: PendingMutation) -> Result<()> {
        mutation.queued_at = Some(Utc::now());

        let mut items = self.peek_all().await?;
        debug!(
            kind = %mutation.kind,
            url = %mutation.url,
            position = items.len(),
            "Queueing mutation"
        );
        items.push(mutation);
        self.replace_all(&items).await
    }

    /// Returns the full queue in replay order
    ///
    /// Absent or unparseable storage reads as an empty queue.
    pub async fn peek_all(&self) -> Result<Vec<PendingMutation>> {
        let raw = self
            .store
            .get(&self.key)
            .await
            .with_context(|| format!("Failed to read mutation queue '{}'", self.key))?;

        let Some(raw) = raw.filter(|s| !s.is_empty()) else {
            return Ok(Vec::new());
        };

        match serde_json::from_str::<Option<Vec<PendingMutation>>>(&raw) {
            Ok(items) => Ok(items.unwrap_or_default()),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to parse mutation queue, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Overwrites the queue with `items`
    pub async fn replace_all(&self, items: &[PendingMutation]) -> Result<()> {
        let payload = serde_json::to_string(items).map_err(CacheError::from)?;
        self.store
            .set(&self.key, &payload)
            .await
            .with_context(|| format!("Failed to write mutation queue '{}'", self.key))
    }

    pub async fn clear(&self) -> Result<()> {
        self.replace_all(&[]).await
    }

    pub async fn len(&self) -> Result<usize> {
        Ok(self.peek_all().await?.len())
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.len().await? == 0)
    }
}
