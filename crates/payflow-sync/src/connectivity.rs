//! Connectivity monitor
//!
//! Holds the client's online/offline state in a `watch` channel. The state
//! is updated explicitly through [`ConnectivityMonitor::set_online`] or by a
//! background probe that pings the API at a fixed interval.
//!
//! ## Flow
//!
//! ```text
//! probe task ──ping()──→ set_online() ──→ watch channel ──→ SyncEngine listener
//!                                                │
//!                                           is_online()
//! ```

use std::{sync::Arc, time::Duration};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use payflow_core::ports::{IConnectivity, IDebtApi};

/// Subscribable online/offline notification source
pub struct ConnectivityMonitor {
    state: watch::Sender<bool>,
}

impl ConnectivityMonitor {
    /// Creates a monitor with the given initial state
    pub fn new(online: bool) -> Self {
        let (state, _) = watch::channel(online);
        Self { state }
    }

    /// Records the current state, notifying subscribers only on a change
    pub fn set_online(&self, online: bool) {
        let changed = self.state.send_if_modified(|current| {
            if *current == online {
                return false;
            }
            *current = online;
            true
        });

        if changed {
            if online {
                info!("Connectivity restored");
            } else {
                warn!("Connectivity lost, writes will be queued");
            }
        }
    }

    /// Starts a task that pings `api` every `interval` and updates the state
    ///
    /// The first ping happens immediately. The task stops when `cancel` is
    /// cancelled.
    pub fn spawn_probe(
        self: &Arc<Self>,
        api: Arc<dyn IDebtApi>,
        interval: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        let monitor = Arc::clone(self);

        info!(
            interval_secs = interval.as_secs(),
            "Starting connectivity probe"
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("Connectivity probe stopped");
                        break;
                    }
                    _ = ticker.tick() => {
                        let online = api.ping().await;
                        debug!(online, "Connectivity probe result");
                        monitor.set_online(online);
                    }
                }
            }
        })
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(true)
    }
}

impl IConnectivity for ConnectivityMonitor {
    fn is_online(&self) -> bool {
        *self.state.borrow()
    }

    fn subscribe(&self) -> watch::Receiver<bool> {
        self.state.subscribe()
    }
}
