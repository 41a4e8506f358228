//! PayFlow API - HTTP client for the debts REST backend
//!
//! Provides the reqwest-based adapter for the `IDebtApi` port:
//! - `GET/POST /debts`, `PUT/DELETE /debts/{id}`
//! - A `HEAD` reachability probe used by the connectivity monitor
//! - Translation of transport and HTTP failures into `ApiError`
//!
//! ## Modules
//!
//! - [`client`] - HTTP client with base URL handling and response decoding
//! - [`errors`] - Mapping of reqwest errors and error bodies to `ApiError`
//! - [`provider`] - `IDebtApi` implementation

pub mod client;
pub mod errors;
pub mod provider;

pub use client::ApiClient;
