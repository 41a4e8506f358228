//! Cache snapshot manager
//!
//! The [`CacheManager`] owns the locally persisted copy of the debt list.
//! It is overwritten wholesale after every successful list fetch and edited
//! piecewise (through [`CacheManager::transform`]) by optimistic writes and
//! queue reconciliation.
//!
//! A stored value that does not parse is treated as if nothing were stored:
//! the caller gets an empty snapshot and a warning is logged. Failures of
//! the underlying store itself are returned as errors.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use payflow_core::domain::{CacheSnapshot, Record, RecordId, RecordPayload};
use payflow_core::ports::IKeyValueStore;

use crate::CacheError;

/// Borrowed view used to serialize a snapshot without cloning the records
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SnapshotRef<'a> {
    data: &'a [Record],
    saved_at: DateTime<Utc>,
}

/// Reads and writes the cached debt list
pub struct CacheManager {
    store: Arc<dyn IKeyValueStore>,
    key: String,
}

impl CacheManager {
    /// Creates a manager storing its snapshot under `key`
    pub fn new(store: Arc<dyn IKeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Returns the last persisted snapshot, or an empty one
    pub async fn read(&self) -> Result<CacheSnapshot> {
        let raw = self
            .store
            .get(&self.key)
            .await
            .with_context(|| format!("Failed to read cache entry '{}'", self.key))?;

        let Some(raw) = raw.filter(|s| !s.is_empty()) else {
            return Ok(CacheSnapshot::default());
        };

        match serde_json::from_str::<CacheSnapshot>(&raw) {
            Ok(snapshot) => Ok(snapshot),
            Err(e) => {
                warn!(key = %self.key, error = %e, "Failed to parse cache snapshot, treating as empty");
                Ok(CacheSnapshot::default())
            }
        }
    }

    /// Replaces the cached records and stamps `savedAt` with the current time
    pub async fn write(&self, records: &[Record]) -> Result<()> {
        let payload = serde_json::to_string(&SnapshotRef {
            data: records,
            saved_at: Utc::now(),
        })
        .map_err(CacheError::from)?;

        self.store
            .set(&self.key, &payload)
            .await
            .with_context(|| format!("Failed to write cache entry '{}'", self.key))?;

        debug!(key = %self.key, records = records.len(), "Cache snapshot written");
        Ok(())
    }

    /// Applies `updater` to a copy of the cached records and persists the result
    ///
    /// The updater receives an owned vector freshly decoded from storage, so
    /// it can never alias the stored value.
    ///
    /// # Returns
    /// The records as written back
    pub async fn transform<F>(&self, updater: F) -> Result<Vec<Record>>
    where
        F: FnOnce(Vec<Record>) -> Vec<Record> + Send,
    {
        let current = self.read().await?.data;
        let next = updater(current);
        self.write(&next).await?;
        Ok(next)
    }

    /// Puts an unconfirmed record for a queued create at the head of the list
    pub async fn prepend_optimistic(
        &self,
        temp_id: &RecordId,
        payload: &RecordPayload,
    ) -> Result<Vec<Record>> {
        let record = Record::optimistic(temp_id.clone(), payload);
        self.transform(move |mut records| {
            records.insert(0, record);
            records
        })
        .await
    }

    /// Merges a queued update's fields into the matching record
    pub async fn merge_optimistic(
        &self,
        id: &RecordId,
        payload: &RecordPayload,
    ) -> Result<Vec<Record>> {
        self.transform(|mut records| {
            for record in records.iter_mut().filter(|r| r.id() == id) {
                record.merge_optimistic(payload);
            }
            records
        })
        .await
    }

    /// Replaces the record identified by `id` with `replacement`
    ///
    /// Used when the server confirms a create (temp id → server record) or
    /// an update. Records that do not match are left untouched.
    pub async fn replace(&self, id: &RecordId, replacement: Record) -> Result<Vec<Record>> {
        self.transform(move |records| {
            records
                .into_iter()
                .map(|r| if r.id() == id { replacement.clone() } else { r })
                .collect()
        })
        .await
    }

    /// Drops the record identified by `id`, keeping the others in order
    pub async fn remove(&self, id: &RecordId) -> Result<Vec<Record>> {
        self.transform(|mut records| {
            records.retain(|r| r.id() != id);
            records
        })
        .await
    }
}
