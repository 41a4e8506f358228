//! Network error classification
//!
//! Decides whether a failed request should be queued for later replay.
//! Only connectivity failures qualify; anything the server actually answered
//! (validation errors, not-found, server faults) must reach the caller.

use std::sync::Arc;

use payflow_core::ports::{ApiError, IConnectivity, NETWORK_ERROR_CODES};

/// Text that marks a connectivity failure in otherwise unclassified errors
const NETWORK_ERROR_PATTERN: &str = "network error";

/// Classifies failures using the current connectivity state and the error chain
pub struct NetworkClassifier {
    connectivity: Arc<dyn IConnectivity>,
}

impl NetworkClassifier {
    pub fn new(connectivity: Arc<dyn IConnectivity>) -> Self {
        Self { connectivity }
    }

    /// Returns true if `err` should be treated as a connectivity failure
    ///
    /// Any error counts while the client believes it is offline.
    pub fn is_network_error(&self, err: &anyhow::Error) -> bool {
        !self.connectivity.is_online() || is_connectivity_failure(err)
    }
}

/// Inspects the error chain independently of the connectivity state
///
/// The first [`ApiError`] found decides, except that a `Network` error with
/// an unrecognised code falls through to the text pattern.
pub fn is_connectivity_failure(err: &anyhow::Error) -> bool {
    for cause in err.chain() {
        if let Some(api_err) = cause.downcast_ref::<ApiError>() {
            match api_err {
                ApiError::Network {
                    code: Some(code), ..
                } if NETWORK_ERROR_CODES.contains(&code.as_str()) => return true,
                ApiError::NoResponse(_) => return true,
                ApiError::Status { .. } | ApiError::InvalidResponse(_) => return false,
                ApiError::Network { .. } => {}
            }
        }

        if let Some(req_err) = cause.downcast_ref::<reqwest::Error>() {
            if req_err.status().is_none() && (req_err.is_connect() || req_err.is_timeout()) {
                return true;
            }
        }
    }

    format!("{err:#}")
        .to_lowercase()
        .contains(NETWORK_ERROR_PATTERN)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ConnectivityMonitor;
    use anyhow::Context;

    fn classifier(online: bool) -> NetworkClassifier {
        NetworkClassifier::new(Arc::new(ConnectivityMonitor::new(online)))
    }

    fn network(code: Option<&str>) -> anyhow::Error {
        ApiError::Network {
            code: code.map(str::to_string),
            message: "connect failed".to_string(),
        }
        .into()
    }

    fn status(code: u16, message: &str) -> anyhow::Error {
        ApiError::Status {
            status: code,
            message: message.to_string(),
        }
        .into()
    }

    #[test]
    fn test_known_codes_are_network_errors() {
        let c = classifier(true);
        for code in NETWORK_ERROR_CODES {
            assert!(c.is_network_error(&network(Some(*code))), "{code}");
        }
    }

    #[test]
    fn test_unknown_code_matches_message_pattern() {
        let c = classifier(true);
        assert!(c.is_network_error(&network(Some("EPIPE"))));
        assert!(c.is_network_error(&network(None)));
    }

    #[test]
    fn test_no_response_is_network_error() {
        let c = classifier(true);
        let err: anyhow::Error = ApiError::NoResponse("timed out".to_string()).into();
        assert!(c.is_network_error(&err));
    }

    #[test]
    fn test_application_errors_are_not_network_errors() {
        let c = classifier(true);
        assert!(!c.is_network_error(&status(400, "Missing required fields")));
        assert!(!c.is_network_error(&status(404, "Debt not found")));
        assert!(!c.is_network_error(&status(503, "Service Unavailable")));

        let err: anyhow::Error = ApiError::InvalidResponse("bad json".to_string()).into();
        assert!(!c.is_network_error(&err));
    }

    #[test]
    fn test_status_wins_over_message_text() {
        let c = classifier(true);
        assert!(!c.is_network_error(&status(500, "Upstream network error")));
    }

    #[test]
    fn test_offline_classifies_everything() {
        let c = classifier(false);
        assert!(c.is_network_error(&status(400, "Missing required fields")));
        assert!(c.is_network_error(&anyhow::anyhow!("anything")));
    }

    #[test]
    fn test_context_wrapping_is_transparent() {
        let c = classifier(true);
        let err = Err::<(), _>(network(Some("ECONNREFUSED")))
            .context("Failed to create debt")
            .unwrap_err();
        assert!(c.is_network_error(&err));

        let err = Err::<(), _>(status(404, "Debt not found"))
            .context("Failed to update debt")
            .unwrap_err();
        assert!(!c.is_network_error(&err));
    }

    #[test]
    fn test_plain_errors_use_text_pattern() {
        let c = classifier(true);
        assert!(c.is_network_error(&anyhow::anyhow!("Network Error")));
        assert!(!c.is_network_error(&anyhow::anyhow!("Unsupported mutation method")));
    }
}
