//! Client session wiring
//!
//! Builds the adapters (SQLite store, HTTP client, connectivity monitor)
//! and the [`SyncEngine`] from the loaded configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{debug, info};

use payflow_api::ApiClient;
use payflow_cache::{CacheManager, DatabasePool, MutationQueue, SqliteKeyValueStore};
use payflow_core::config::Config;
use payflow_core::ports::{IDebtApi, IKeyValueStore};
use payflow_sync::{ConnectivityMonitor, SyncEngine};

use crate::output::OutputFormat;

/// Global options every command receives
pub struct CliContext {
    pub format: OutputFormat,
    pub config_path: PathBuf,
    pub config: Config,
}

/// A wired client: engine plus the adapters it was built from
pub struct Session {
    pub engine: SyncEngine,
    pub api: Arc<dyn IDebtApi>,
    pub monitor: Arc<ConnectivityMonitor>,
    /// Kept open for the lifetime of the session
    pool: DatabasePool,
}

impl Session {
    /// Opens local storage, builds the API client and probes reachability once
    pub async fn open(config: &Config) -> Result<Self> {
        let pool = DatabasePool::new(&config.storage.db_path)
            .await
            .with_context(|| {
                format!(
                    "Failed to open local database at {}",
                    config.storage.db_path.display()
                )
            })?;
        let store: Arc<dyn IKeyValueStore> =
            Arc::new(SqliteKeyValueStore::new(pool.pool().clone()));

        let base_url = config.effective_base_url();
        let api: Arc<dyn IDebtApi> = Arc::new(ApiClient::new(
            base_url.clone(),
            Duration::from_secs(config.api.timeout_secs),
        )?);

        let online = api.ping().await;
        info!(base_url = %base_url, online, "Client session opened");

        let monitor = Arc::new(ConnectivityMonitor::new(online));
        let engine = SyncEngine::new(
            Arc::clone(&api),
            CacheManager::new(Arc::clone(&store), config.storage.cache_key.clone()),
            MutationQueue::new(store, config.storage.queue_key.clone()),
            monitor.clone(),
        );

        Ok(Self {
            engine,
            api,
            monitor,
            pool,
        })
    }

    /// Stops background work started by the engine
    pub async fn close(self) {
        self.engine.shutdown().await;
        self.pool.close().await;
        debug!("Client session closed");
    }
}
