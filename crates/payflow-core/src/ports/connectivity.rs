//! Connectivity port
//!
//! Reports whether the client currently believes it is online and lets
//! subscribers observe transitions. Backed by a `tokio::sync::watch`
//! channel so that late subscribers see the current state immediately.

use tokio::sync::watch;

/// Port trait for online/offline state
pub trait IConnectivity: Send + Sync {
    /// Current best guess of network reachability
    fn is_online(&self) -> bool;

    /// Subscribes to state changes; the receiver starts at the current state
    fn subscribe(&self) -> watch::Receiver<bool>;
}
