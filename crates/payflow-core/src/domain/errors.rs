//! Domain error types
//!
//! Validation failures for identifiers and request payloads.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Record identifier is empty or not usable in a resource path
    #[error("Invalid record ID: {0}")]
    InvalidRecordId(String),

    /// Request payload is not a JSON object
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}
