//! Pending (queued) mutations
//!
//! A [`PendingMutation`] is a write that failed for connectivity reasons and
//! waits in the mutation queue for replay. It carries the HTTP verb, the
//! resource path and the body, so replaying it needs no other client state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::RecordId;
use super::record::RecordPayload;

/// Collection path of the debts resource, relative to the API base URL
pub const DEBTS_PATH: &str = "/debts";

/// Path of a single debt document
pub fn debt_path(id: &RecordId) -> String {
    format!("{}/{}", DEBTS_PATH, id.as_str())
}

/// What a queued mutation does to the debt list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MutationKind::Create => "create",
            MutationKind::Update => "update",
            MutationKind::Delete => "delete",
        };
        write!(f, "{}", s)
    }
}

/// HTTP verb used to replay a queued mutation
///
/// Values written by other clients that this build does not know are read
/// back as [`MutationMethod::Unsupported`] instead of invalidating the whole
/// queue; replaying such an entry fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationMethod {
    Post,
    Put,
    Delete,
    #[serde(other)]
    Unsupported,
}

impl std::fmt::Display for MutationMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MutationMethod::Post => "POST",
            MutationMethod::Put => "PUT",
            MutationMethod::Delete => "DELETE",
            MutationMethod::Unsupported => "UNSUPPORTED",
        };
        write!(f, "{}", s)
    }
}

/// A write operation waiting for replay against the server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMutation {
    pub kind: MutationKind,
    pub method: MutationMethod,
    /// Resource path relative to the API base URL
    pub url: String,
    /// Request body (absent for deletes)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<RecordPayload>,
    /// Server identifier targeted by an update or delete
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RecordId>,
    /// Placeholder identifier of an optimistically created record
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temp_id: Option<RecordId>,
    /// Set by the mutation queue when the entry is appended
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queued_at: Option<DateTime<Utc>>,
}

impl PendingMutation {
    /// `POST /debts` creating the record shown locally as `temp_id`
    pub fn create(payload: RecordPayload, temp_id: RecordId) -> Self {
        Self {
            kind: MutationKind::Create,
            method: MutationMethod::Post,
            url: DEBTS_PATH.to_string(),
            payload: Some(payload),
            id: None,
            temp_id: Some(temp_id),
            queued_at: None,
        }
    }

    /// `PUT /debts/{id}`
    pub fn update(id: RecordId, payload: RecordPayload) -> Self {
        Self {
            kind: MutationKind::Update,
            method: MutationMethod::Put,
            url: debt_path(&id),
            payload: Some(payload),
            id: Some(id),
            temp_id: None,
            queued_at: None,
        }
    }

    /// `DELETE /debts/{id}`
    pub fn delete(id: RecordId) -> Self {
        Self {
            kind: MutationKind::Delete,
            method: MutationMethod::Delete,
            url: debt_path(&id),
            payload: None,
            id: Some(id),
            temp_id: None,
            queued_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn rid(s: &str) -> RecordId {
        RecordId::new(s.to_string()).unwrap()
    }

    #[test]
    fn test_create_shape() {
        let payload = RecordPayload::new().with("name", "A");
        let m = PendingMutation::create(payload.clone(), rid("offline-1"));
        assert_eq!(m.kind, MutationKind::Create);
        assert_eq!(m.method, MutationMethod::Post);
        assert_eq!(m.url, "/debts");
        assert_eq!(m.payload, Some(payload));
        assert_eq!(m.temp_id, Some(rid("offline-1")));
        assert!(m.id.is_none());
    }

    #[test]
    fn test_update_and_delete_urls() {
        let m = PendingMutation::update(rid("abc"), RecordPayload::new());
        assert_eq!(m.url, "/debts/abc");
        assert_eq!(m.method, MutationMethod::Put);

        let m = PendingMutation::delete(rid("abc"));
        assert_eq!(m.url, "/debts/abc");
        assert_eq!(m.method, MutationMethod::Delete);
        assert!(m.payload.is_none());
    }

    #[test]
    fn test_wire_format_uses_camel_case() {
        let m = PendingMutation::create(RecordPayload::new(), rid("offline-9"));
        let value = serde_json::to_value(&m).unwrap();
        assert_eq!(value["kind"], json!("create"));
        assert_eq!(value["method"], json!("post"));
        assert_eq!(value["tempId"], json!("offline-9"));
        assert!(value.get("id").is_none());
        assert!(value.get("queuedAt").is_none());
    }

    #[test]
    fn test_unknown_method_reads_as_unsupported() {
        let m: PendingMutation = serde_json::from_value(json!({
            "kind": "update",
            "method": "patch",
            "url": "/debts/abc",
            "id": "abc"
        }))
        .unwrap();
        assert_eq!(m.method, MutationMethod::Unsupported);
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(MutationKind::Delete.to_string(), "delete");
        assert_eq!(MutationMethod::Put.to_string(), "PUT");
    }
}
