//! Newtype wrappers for domain identifiers
//!
//! [`RecordId`] wraps both server-assigned identifiers (MongoDB ObjectIds)
//! and client-generated temporary identifiers for records created while
//! offline. Temporary identifiers carry the `offline-` prefix.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Prefix of client-generated identifiers
pub const TEMP_ID_PREFIX: &str = "offline-";

/// Identifier of a debt record
///
/// Format: any non-empty string without whitespace, `/`, `?` or `#`, so that
/// it can be embedded in a resource path as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordId(String);

impl RecordId {
    /// Create a new RecordId
    ///
    /// # Errors
    /// Returns error if the ID is empty or contains path-breaking characters
    pub fn new(id: String) -> Result<Self, DomainError> {
        if id.is_empty() {
            return Err(DomainError::InvalidRecordId(
                "Record ID cannot be empty".to_string(),
            ));
        }

        if id
            .chars()
            .any(|c| c.is_whitespace() || c == '/' || c == '?' || c == '#')
        {
            return Err(DomainError::InvalidRecordId(format!(
                "Record ID contains invalid characters: {id}"
            )));
        }

        Ok(Self(id))
    }

    /// Generate a fresh temporary identifier for an optimistically created record
    ///
    /// Format: `offline-<unix millis>-<8 hex chars>`.
    #[must_use]
    pub fn temporary() -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{TEMP_ID_PREFIX}{}-{}",
            Utc::now().timestamp_millis(),
            &suffix[..8]
        ))
    }

    /// Whether this identifier was generated on the client
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_ID_PREFIX)
    }

    /// Get the inner string reference
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RecordId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s.to_string())
    }
}

impl TryFrom<String> for RecordId {
    type Error = DomainError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.0
    }
}
