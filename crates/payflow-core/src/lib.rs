//! PayFlow Core - Domain types and port definitions
//!
//! This crate contains the hexagonal architecture core of the PayFlow client:
//! - **Domain entities** - `Record`, `RecordPayload`, `PendingMutation`, `CacheSnapshot`
//! - **Port definitions** - Traits for adapters: `IKeyValueStore`, `IDebtApi`, `IConnectivity`
//! - **Configuration** - YAML-backed settings for the API, storage and connectivity probe
//!
//! # Architecture
//!
//! The domain module holds plain data types with no I/O. Ports define the
//! trait interfaces implemented by the adapter crates (`payflow-cache`,
//! `payflow-api`, `payflow-sync`).

pub mod config;
pub mod domain;
pub mod ports;
