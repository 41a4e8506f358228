//! Offline-first sync engine
//!
//! The [`SyncEngine`] is the only entry point callers use for the debt list.
//! Reads go to the network first and fall back to the cache snapshot; writes
//! go to the network first and, when the failure is a connectivity failure,
//! are applied optimistically to the cache and queued.
//!
//! ## Drain
//!
//! Queued mutations are replayed strictly in order, one request at a time.
//! The first failure halts the drain: the failed item and everything after it
//! stay queued for the next trigger. Successful items are reconciled into the
//! cache as they complete. A drain runs:
//! - once when the engine is first used,
//! - after every queued write (spawned, not awaited; `shutdown` waits for it),
//! - on every offline → online transition of the connectivity source.
//!
//! At most one drain runs at a time per engine; a trigger that arrives while
//! a drain is in flight is dropped.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, Weak,
};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, info, warn};

use payflow_cache::{CacheManager, MutationQueue};
use payflow_core::domain::{
    debt_path, CacheSnapshot, MutationKind, PendingMutation, Record, RecordId, RecordPayload,
};
use payflow_core::ports::{IConnectivity, IDebtApi};

use crate::classifier::NetworkClassifier;
use crate::SyncError;

// ============================================================================
// Operation results
// ============================================================================

/// Where a list result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListSource {
    Network,
    Cache,
}

impl std::fmt::Display for ListSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListSource::Network => write!(f, "network"),
            ListSource::Cache => write!(f, "cache"),
        }
    }
}

/// Result of [`SyncEngine::fetch_list`]
#[derive(Debug, Clone, Serialize)]
pub struct ListOutcome {
    pub data: Vec<Record>,
    pub source: ListSource,
    /// Message of the network failure masked by a cache fallback
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of [`SyncEngine::create`]
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutcome {
    pub queued: bool,
    /// Record echoed by the server (direct writes only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    /// Placeholder identifier of the optimistic record (queued writes only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<RecordId>,
}

/// Result of [`SyncEngine::update`]
#[derive(Debug, Clone, Serialize)]
pub struct UpdateOutcome {
    pub queued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Result of [`SyncEngine::delete`]
#[derive(Debug, Clone, Serialize)]
pub struct DeleteOutcome {
    pub queued: bool,
}

/// Summary of one drain pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlushReport {
    /// Replays sent, including the one that failed
    pub attempted: usize,
    pub succeeded: usize,
    /// Items left in the queue after the pass
    pub remaining: usize,
}

impl FlushReport {
    /// Whether the pass stopped at a failed replay
    pub fn halted(&self) -> bool {
        self.succeeded < self.attempted
    }
}

// ============================================================================
// Single-flight guard
// ============================================================================

/// Holds the drain flag; releases it when dropped
struct FlushGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> FlushGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for FlushGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

// ============================================================================
// SyncEngine
// ============================================================================

struct EngineInner {
    api: Arc<dyn IDebtApi>,
    cache: CacheManager,
    queue: MutationQueue,
    connectivity: Arc<dyn IConnectivity>,
    classifier: NetworkClassifier,
    is_flushing: AtomicBool,
    initialized: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
    /// Drains spawned after queued writes
    drains: TaskTracker,
    cancel: CancellationToken,
}

/// Offline-first client for the debt list
///
/// Cloning is cheap; clones share all state, including the drain guard.
#[derive(Clone)]
pub struct SyncEngine {
    inner: Arc<EngineInner>,
}

impl SyncEngine {
    /// Creates an engine over the given API, local state and connectivity source
    pub fn new(
        api: Arc<dyn IDebtApi>,
        cache: CacheManager,
        queue: MutationQueue,
        connectivity: Arc<dyn IConnectivity>,
    ) -> Self {
        let classifier = NetworkClassifier::new(Arc::clone(&connectivity));
        Self {
            inner: Arc::new(EngineInner {
                api,
                cache,
                queue,
                connectivity,
                classifier,
                is_flushing: AtomicBool::new(false),
                initialized: AtomicBool::new(false),
                listener: Mutex::new(None),
                drains: TaskTracker::new(),
                cancel: CancellationToken::new(),
            }),
        }
    }

    /// Registers the reconnect listener and runs one drain
    ///
    /// Only the first call has any effect. Every list/write operation calls
    /// this, so explicit use is only needed to drain at startup.
    pub async fn initialize(&self) {
        if self.inner.initialized.swap(true, Ordering::AcqRel) {
            return;
        }

        let handle = spawn_reconnect_listener(
            Arc::downgrade(&self.inner),
            self.inner.connectivity.subscribe(),
            self.inner.cancel.clone(),
        );
        if let Ok(mut slot) = self.inner.listener.lock() {
            *slot = Some(handle);
        }

        debug!("Sync engine initialized");

        if let Err(e) = self.flush_queue().await {
            warn!(error = %e, "Initial queue drain failed");
        }
    }

    /// Stops the reconnect listener and waits for scheduled drains
    ///
    /// A drain that is mid-replay runs to completion so the queue reflects
    /// what the server accepted. The engine stays usable; queued writes are
    /// then only drained by explicit [`flush_queue`](Self::flush_queue)
    /// calls and later writes.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();

        let handle = self
            .inner
            .listener
            .lock()
            .ok()
            .and_then(|mut slot| slot.take());
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Reconnect listener ended abnormally");
            }
        }

        self.inner.drains.close();
        self.inner.drains.wait().await;

        info!("Sync engine shut down");
    }

    // ------------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------------

    /// Fetches the debt list, falling back to the cache on failure
    ///
    /// # Errors
    /// Returns the original network error when the cache is empty too.
    pub async fn fetch_list(&self) -> Result<ListOutcome> {
        self.initialize().await;

        let err = match self.pull().await {
            Ok(data) => {
                return Ok(ListOutcome {
                    data,
                    source: ListSource::Network,
                    error: None,
                })
            }
            Err(e) => e,
        };

        let snapshot = match self.inner.cache.read().await {
            Ok(snapshot) => snapshot,
            Err(cache_err) => {
                warn!(error = %cache_err, "Cache unavailable for fallback");
                return Err(err);
            }
        };
        if snapshot.data.is_empty() {
            return Err(err);
        }

        warn!(
            error = %err,
            cached = snapshot.data.len(),
            "Using cached debts due to network issue"
        );
        Ok(ListOutcome {
            data: snapshot.data,
            source: ListSource::Cache,
            error: Some(format!("{err:#}")),
        })
    }

    /// Network read that overwrites the cache on success
    async fn pull(&self) -> Result<Vec<Record>> {
        let data = self.inner.api.list_debts().await?;
        self.inner
            .cache
            .write(&data)
            .await
            .context("Failed to update cache after fetch")?;
        Ok(data)
    }

    // ------------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------------

    /// Creates a debt, queueing it if the server is unreachable
    pub async fn create(&self, payload: RecordPayload) -> Result<CreateOutcome> {
        self.initialize().await;

        let payload = payload.normalize();
        let temp_id = RecordId::temporary();
        let mutation = PendingMutation::create(payload.clone(), temp_id.clone());

        match self.send(&mutation).await {
            Ok(data) => {
                self.refresh_after_write().await;
                Ok(CreateOutcome {
                    queued: false,
                    data,
                    temp_id: None,
                })
            }
            Err(e) if self.inner.classifier.is_network_error(&e) => {
                info!(temp_id = %temp_id, error = %e, "Create queued for later");
                self.inner
                    .cache
                    .prepend_optimistic(&temp_id, &payload)
                    .await?;
                self.enqueue(mutation).await?;
                Ok(CreateOutcome {
                    queued: true,
                    data: None,
                    temp_id: Some(temp_id),
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Updates a debt, queueing the change if the server is unreachable
    pub async fn update(&self, id: &RecordId, payload: RecordPayload) -> Result<UpdateOutcome> {
        self.initialize().await;

        let payload = payload.normalize();
        let mutation = PendingMutation::update(id.clone(), payload.clone());

        match self.send(&mutation).await {
            Ok(data) => {
                self.refresh_after_write().await;
                Ok(UpdateOutcome {
                    queued: false,
                    data,
                })
            }
            Err(e) if self.inner.classifier.is_network_error(&e) => {
                info!(id = %id, error = %e, "Update queued for later");
                self.inner.cache.merge_optimistic(id, &payload).await?;
                self.enqueue(mutation).await?;
                Ok(UpdateOutcome {
                    queued: true,
                    data: None,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Deletes a debt, queueing the removal if the server is unreachable
    pub async fn delete(&self, id: &RecordId) -> Result<DeleteOutcome> {
        self.initialize().await;

        let mutation = PendingMutation::delete(id.clone());

        match self.send(&mutation).await {
            Ok(_) => {
                self.refresh_after_write().await;
                Ok(DeleteOutcome { queued: false })
            }
            Err(e) if self.inner.classifier.is_network_error(&e) => {
                info!(id = %id, error = %e, "Delete queued for later");
                self.inner.cache.remove(id).await?;
                self.enqueue(mutation).await?;
                Ok(DeleteOutcome { queued: true })
            }
            Err(e) => Err(e),
        }
    }

    async fn send(&self, mutation: &PendingMutation) -> Result<Option<Value>> {
        self.inner
            .api
            .send(mutation.method, &mutation.url, mutation.payload.as_ref())
            .await
    }

    /// Authoritative resync after a direct write
    ///
    /// The write itself already succeeded, so a failure here is only logged.
    async fn refresh_after_write(&self) {
        if let Err(e) = self.fetch_list().await {
            warn!(error = %e, "Failed to refresh debt list after write");
        }
    }

    async fn enqueue(&self, mutation: PendingMutation) -> Result<()> {
        self.inner
            .queue
            .enqueue(mutation)
            .await
            .context("Failed to queue mutation")?;
        self.schedule_flush();
        Ok(())
    }

    /// Spawns a drain without waiting for it
    fn schedule_flush(&self) {
        if !self.inner.connectivity.is_online() {
            debug!("Offline, drain deferred until reconnect");
            return;
        }

        let engine = self.clone();
        self.inner.drains.spawn(async move {
            if let Err(e) = engine.flush_queue().await {
                warn!(error = %e, "Scheduled queue drain failed");
            }
        });
    }

    // ------------------------------------------------------------------------
    // Drain
    // ------------------------------------------------------------------------

    /// Replays queued mutations in order, halting at the first failure
    ///
    /// Returns an empty report when a drain is already running, the client is
    /// offline, or nothing is queued.
    pub async fn flush_queue(&self) -> Result<FlushReport> {
        let Some(_guard) = FlushGuard::acquire(&self.inner.is_flushing) else {
            debug!("Drain already in progress, skipping");
            return Ok(FlushReport::default());
        };

        if !self.inner.connectivity.is_online() {
            debug!("Offline, skipping drain");
            return Ok(FlushReport::default());
        }

        let mut items = self.inner.queue.peek_all().await?;
        if items.is_empty() {
            return Ok(FlushReport::default());
        }

        let drained = items.len();
        info!(queued = drained, "Draining mutation queue");

        let mut report = FlushReport::default();
        let mut remaps = Vec::new();
        for index in 0..items.len() {
            report.attempted += 1;
            let item = items[index].clone();

            match self.send(&item).await {
                Ok(response) => {
                    report.succeeded += 1;
                    if let Some((temp_id, server_id)) = self.reconcile(&item, response).await {
                        remap_temp_id(&mut items[index + 1..], &temp_id, &server_id);
                        remaps.push((temp_id, server_id));
                    }
                }
                Err(e) => {
                    warn!(
                        kind = %item.kind,
                        url = %item.url,
                        error = %e,
                        "Failed to flush queued mutation, will retry later"
                    );
                    let remaining = self
                        .persist_remaining(&items[index..], drained, &remaps)
                        .await?;
                    report.remaining = remaining;
                    return Ok(report);
                }
            }
        }

        report.remaining = self.persist_remaining(&[], drained, &remaps).await?;
        info!(replayed = report.succeeded, "Mutation queue drained");

        if let Err(e) = self.pull().await {
            warn!(error = %e, "Failed to refresh cache after flush");
        }

        Ok(report)
    }

    /// Writes `remaining` back, followed by anything enqueued during the drain
    ///
    /// Items enqueued during the drain still carry temp ids confirmed by it,
    /// so `remaps` is applied to them too.
    async fn persist_remaining(
        &self,
        remaining: &[PendingMutation],
        drained: usize,
        remaps: &[(RecordId, RecordId)],
    ) -> Result<usize> {
        let mut appended: Vec<PendingMutation> = self
            .inner
            .queue
            .peek_all()
            .await?
            .into_iter()
            .skip(drained)
            .collect();

        if !appended.is_empty() {
            debug!(count = appended.len(), "Keeping mutations queued during drain");
            for (temp_id, server_id) in remaps {
                remap_temp_id(&mut appended, temp_id, server_id);
            }
        }

        let mut next = remaining.to_vec();
        next.extend(appended);
        self.inner
            .queue
            .replace_all(&next)
            .await
            .context("Failed to persist mutation queue")?;
        Ok(next.len())
    }

    /// Applies a successful replay to the cache
    ///
    /// Returns `(temp_id, server_id)` when a queued create received its
    /// permanent identifier. Cache failures are logged: the server already
    /// accepted the write, so the item must not be replayed again.
    async fn reconcile(
        &self,
        item: &PendingMutation,
        response: Option<Value>,
    ) -> Option<(RecordId, RecordId)> {
        let result = match item.kind {
            MutationKind::Create => self.reconcile_create(item, response).await,
            MutationKind::Update => self.reconcile_update(response).await.map(|_| None),
            MutationKind::Delete => self.reconcile_delete(item).await.map(|_| None),
        };

        match result {
            Ok(remap) => remap,
            Err(e) => {
                warn!(kind = %item.kind, url = %item.url, error = %e, "Failed to reconcile cache");
                None
            }
        }
    }

    async fn reconcile_create(
        &self,
        item: &PendingMutation,
        response: Option<Value>,
    ) -> Result<Option<(RecordId, RecordId)>> {
        let temp_id = item
            .temp_id
            .clone()
            .ok_or_else(|| SyncError::MalformedMutation("create without tempId".to_string()))?;
        let record = server_record(response)?;
        let server_id = record.id().clone();

        self.inner.cache.replace(&temp_id, record).await?;
        debug!(temp_id = %temp_id, server_id = %server_id, "Optimistic record confirmed");
        Ok(Some((temp_id, server_id)))
    }

    async fn reconcile_update(&self, response: Option<Value>) -> Result<()> {
        let record = server_record(response)?;
        let id = record.id().clone();
        self.inner.cache.replace(&id, record).await?;
        Ok(())
    }

    async fn reconcile_delete(&self, item: &PendingMutation) -> Result<()> {
        let id = item
            .id
            .as_ref()
            .ok_or_else(|| SyncError::MalformedMutation("delete without id".to_string()))?;
        self.inner.cache.remove(id).await?;
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Status
    // ------------------------------------------------------------------------

    /// Mutations waiting for replay, in order
    pub async fn pending_mutations(&self) -> Result<Vec<PendingMutation>> {
        self.inner.queue.peek_all().await
    }

    /// The locally cached list, without touching the network
    pub async fn cached_snapshot(&self) -> Result<CacheSnapshot> {
        self.inner.cache.read().await
    }

    pub fn is_online(&self) -> bool {
        self.inner.connectivity.is_online()
    }

    pub fn is_flushing(&self) -> bool {
        self.inner.is_flushing.load(Ordering::Acquire)
    }
}

/// Decodes a write response as a debt record
fn server_record(response: Option<Value>) -> Result<Record, SyncError> {
    let value = response
        .ok_or_else(|| SyncError::UnexpectedResponse("empty response body".to_string()))?;
    serde_json::from_value(value).map_err(|e| SyncError::UnexpectedResponse(e.to_string()))
}

/// Points later queued writes at a record's permanent identifier
fn remap_temp_id(items: &mut [PendingMutation], temp_id: &RecordId, server_id: &RecordId) {
    for item in items.iter_mut().filter(|m| m.id.as_ref() == Some(temp_id)) {
        item.id = Some(server_id.clone());
        item.url = debt_path(server_id);
    }
}

/// Drains the queue on every offline → online transition until cancelled
fn spawn_reconnect_listener(
    inner: Weak<EngineInner>,
    mut rx: tokio::sync::watch::Receiver<bool>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    // Read before spawning so a transition racing the task start is not missed
    let mut was_online = *rx.borrow_and_update();

    tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                changed = rx.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let online = *rx.borrow_and_update();
                    if online && !was_online {
                        let Some(inner) = inner.upgrade() else { break };
                        info!("Back online, draining mutation queue");
                        let engine = SyncEngine { inner };
                        if let Err(e) = engine.flush_queue().await {
                            warn!(error = %e, "Queue drain after reconnect failed");
                        }
                    }
                    was_online = online;
                }
            }
        }

        debug!("Reconnect listener stopped");
    })
}
