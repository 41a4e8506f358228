//! Domain entities
//!
//! - Newtypes for record identifiers
//! - Debt records and request payloads
//! - Cache snapshots
//! - Pending (queued) mutations
//! - Domain-specific error types

pub mod errors;
pub mod mutation;
pub mod newtypes;
pub mod record;

pub use errors::DomainError;
pub use mutation::{debt_path, MutationKind, MutationMethod, PendingMutation, DEBTS_PATH};
pub use newtypes::RecordId;
pub use record::{CacheSnapshot, Record, RecordPayload};
