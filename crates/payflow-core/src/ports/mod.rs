//! Port definitions (hexagonal architecture interfaces)
//!
//! Ports are the interfaces the sync logic depends on; their
//! implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IKeyValueStore`] - Persistent local key-value storage (cache snapshot, mutation queue)
//! - [`IDebtApi`] - The `/debts` REST resource
//! - [`IConnectivity`] - Online/offline state and transition notifications

pub mod connectivity;
pub mod debt_api;
pub mod key_value_store;

pub use connectivity::IConnectivity;
pub use debt_api::{ApiError, IDebtApi, NETWORK_ERROR_CODES};
pub use key_value_store::IKeyValueStore;
