//! Translation of HTTP client failures into [`ApiError`]
//!
//! Transport failures are split into two groups so the network classifier
//! can recognise them without string matching:
//! - the request never reached the server → [`ApiError::Network`] with a
//!   transport code (`ECONNREFUSED`, `ENOTFOUND`, ... or `ERR_NETWORK`)
//! - the request was sent but no answer came back → [`ApiError::NoResponse`]

use std::error::Error as StdError;
use std::io;

use reqwest::StatusCode;
use serde::Deserialize;

use payflow_core::ports::ApiError;

/// Error body returned by the server, e.g. `{"message": "Debt not found"}`
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

/// Maps a reqwest error raised before a response was received
pub fn from_transport(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        return ApiError::NoResponse(render_chain(&err));
    }

    if err.is_decode() {
        return ApiError::InvalidResponse(render_chain(&err));
    }

    if let Some(status) = err.status() {
        return ApiError::Status {
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string(),
        };
    }

    let code = transport_code(&err).unwrap_or("ERR_NETWORK");

    ApiError::Network {
        code: Some(code.to_string()),
        message: render_chain(&err),
    }
}

/// Builds the error for a non-success response from its status and body
///
/// Uses the body's `message` field when present, the status reason otherwise.
pub fn from_status(status: StatusCode, body: &str) -> ApiError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string()
        });

    ApiError::Status {
        status: status.as_u16(),
        message,
    }
}

/// Looks for a well-known transport failure in the source chain
fn transport_code(err: &(dyn StdError + 'static)) -> Option<&'static str> {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return Some("ECONNREFUSED"),
                io::ErrorKind::ConnectionReset | io::ErrorKind::ConnectionAborted => {
                    return Some("ECONNRESET")
                }
                io::ErrorKind::TimedOut => return Some("ETIMEDOUT"),
                _ => {}
            }
        }

        let text = e.to_string().to_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return Some("ENOTFOUND");
        }

        current = e.source();
    }
    None
}

/// Joins an error and its sources into one line
fn render_chain(err: &(dyn StdError + 'static)) -> String {
    let mut parts = vec![err.to_string()];
    let mut current = err.source();
    while let Some(e) = current {
        let text = e.to_string();
        if parts.last() != Some(&text) {
            parts.push(text);
        }
        current = e.source();
    }
    parts.join(": ")
}
