//! Debt API port (driven/secondary port)
//!
//! This module defines the interface to the server's `/debts` resource.
//!
//! ## Design Notes
//!
//! - Methods return `anyhow::Result`; adapters wrap transport and HTTP
//!   failures in [`ApiError`] so that callers can classify them by
//!   downcasting through the error chain.
//! - [`IDebtApi::send`] is the single write primitive. Direct writes and
//!   queue replays both go through it with the verb, path and body stored in
//!   a [`PendingMutation`](crate::domain::PendingMutation).

use serde_json::Value;
use thiserror::Error;

use crate::domain::{
    debt_path, MutationMethod, Record, RecordId, RecordPayload, DEBTS_PATH,
};

/// Transport error codes that indicate a connectivity problem
pub const NETWORK_ERROR_CODES: &[&str] = &[
    "ERR_NETWORK",
    "ECONNREFUSED",
    "ECONNRESET",
    "ETIMEDOUT",
    "ENOTFOUND",
    "EAI_AGAIN",
];

/// Errors produced by [`IDebtApi`] adapters
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be delivered (DNS, refused connection, reset, ...)
    #[error("Network Error: {message}")]
    Network {
        /// Transport error code, e.g. `ERR_NETWORK` or `ECONNREFUSED`
        code: Option<String>,
        /// Human-readable description
        message: String,
    },

    /// The request was sent but no response arrived (e.g. timeout)
    #[error("No response received: {0}")]
    NoResponse(String),

    /// The server answered with a non-success status
    #[error("Request failed with status {status}: {message}")]
    Status {
        /// HTTP status code
        status: u16,
        /// `message` field of the error body, or the status reason
        message: String,
    },

    /// The response body could not be parsed
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl ApiError {
    /// HTTP status of the response, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Whether the server rejected the request body (4xx other than 404)
    pub fn is_validation(&self) -> bool {
        matches!(self.status(), Some(s) if (400..500).contains(&s) && s != 404)
    }
}

/// Port trait for the `/debts` REST resource
#[async_trait::async_trait]
pub trait IDebtApi: Send + Sync {
    /// `GET /debts` - all debt records, newest first
    async fn list_debts(&self) -> anyhow::Result<Vec<Record>>;

    /// Sends a write request and returns the decoded response body
    ///
    /// # Arguments
    /// * `method` - HTTP verb
    /// * `path` - Resource path relative to the API base URL
    /// * `body` - JSON body (ignored for `DELETE`)
    ///
    /// # Returns
    /// The JSON response body, or `None` when the body is empty
    async fn send(
        &self,
        method: MutationMethod,
        path: &str,
        body: Option<&RecordPayload>,
    ) -> anyhow::Result<Option<Value>>;

    /// Reachability probe: `true` if the server answered at all
    async fn ping(&self) -> bool;

    /// `POST /debts`
    async fn create_debt(&self, payload: &RecordPayload) -> anyhow::Result<Option<Value>> {
        self.send(MutationMethod::Post, DEBTS_PATH, Some(payload))
            .await
    }

    /// `PUT /debts/{id}`
    async fn update_debt(
        &self,
        id: &RecordId,
        payload: &RecordPayload,
    ) -> anyhow::Result<Option<Value>> {
        self.send(MutationMethod::Put, &debt_path(id), Some(payload))
            .await
    }

    /// `DELETE /debts/{id}`
    async fn delete_debt(&self, id: &RecordId) -> anyhow::Result<Option<Value>> {
        self.send(MutationMethod::Delete, &debt_path(id), None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_helpers() {
        let err = ApiError::Status {
            status: 404,
            message: "Debt not found".to_string(),
        };
        assert!(err.is_not_found());
        assert!(!err.is_validation());
        assert_eq!(err.status(), Some(404));

        let err = ApiError::Status {
            status: 400,
            message: "Missing required fields".to_string(),
        };
        assert!(err.is_validation());

        let err = ApiError::Status {
            status: 500,
            message: "boom".to_string(),
        };
        assert!(!err.is_validation());
    }

    #[test]
    fn test_network_error_display() {
        let err = ApiError::Network {
            code: Some("ERR_NETWORK".to_string()),
            message: "connection refused".to_string(),
        };
        assert_eq!(err.to_string(), "Network Error: connection refused");
        assert!(err.status().is_none());
    }

    #[test]
    fn test_network_codes_include_err_network() {
        assert!(NETWORK_ERROR_CODES.contains(&"ERR_NETWORK"));
    }
}
