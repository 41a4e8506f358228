//! Debt records, request payloads and cache snapshots
//!
//! A [`Record`] is the server-shaped debt document. The client only
//! interprets its identifier and `paid` flag; every other field (name,
//! phone, boxName, amount, date, note, timestamps, ...) travels through an
//! open JSON map so that fields added on the server survive a round-trip
//! through the local cache.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};

use super::errors::DomainError;
use super::newtypes::RecordId;

/// Wire name of the identifier field
pub const ID_FIELD: &str = "_id";

/// Wire name of the unconfirmed-record marker
pub const OPTIMISTIC_FIELD: &str = "__optimistic";

fn null_as_false<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

fn is_false(value: &bool) -> bool {
    !*value
}

// ============================================================================
// Record
// ============================================================================

/// A debt record as returned by `GET /debts`
///
/// Optimistically created records carry a temporary identifier (see
/// [`RecordId::temporary`]) and `optimistic == true` until the queued create
/// is replayed and the server record replaces them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id")]
    id: RecordId,
    #[serde(default, deserialize_with = "null_as_false")]
    paid: bool,
    #[serde(
        rename = "__optimistic",
        default,
        deserialize_with = "null_as_false",
        skip_serializing_if = "is_false"
    )]
    optimistic: bool,
    #[serde(flatten)]
    fields: Map<String, Value>,
}

impl Record {
    /// Creates a confirmed record with no payload fields
    pub fn new(id: RecordId) -> Self {
        Self {
            id,
            paid: false,
            optimistic: false,
            fields: Map::new(),
        }
    }

    /// Builds the local placeholder for a create that could not reach the server
    ///
    /// `paid` defaults to `false` unless the payload sets it.
    pub fn optimistic(temp_id: RecordId, payload: &RecordPayload) -> Self {
        let mut record = Self::new(temp_id);
        record.apply(payload);
        record.optimistic = true;
        record
    }

    /// Merges payload fields over this record and marks it unconfirmed
    ///
    /// The identifier is never overwritten by the payload.
    pub fn merge_optimistic(&mut self, payload: &RecordPayload) {
        self.apply(payload);
        self.optimistic = true;
    }

    fn apply(&mut self, payload: &RecordPayload) {
        for (key, value) in payload.as_map() {
            match key.as_str() {
                ID_FIELD | OPTIMISTIC_FIELD => {}
                "paid" => self.paid = value.as_bool().unwrap_or(self.paid),
                _ => {
                    self.fields.insert(key.clone(), value.clone());
                }
            }
        }
    }

    /// Sets an arbitrary payload field (builder style)
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Sets the paid flag (builder style)
    pub fn with_paid(mut self, paid: bool) -> Self {
        self.paid = paid;
        self
    }

    pub fn id(&self) -> &RecordId {
        &self.id
    }

    pub fn paid(&self) -> bool {
        self.paid
    }

    /// Whether this record holds local edits the server has not confirmed
    pub fn is_optimistic(&self) -> bool {
        self.optimistic
    }

    /// Looks up an uninterpreted payload field
    pub fn field(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }
}

// ============================================================================
// RecordPayload
// ============================================================================

/// Request body for `POST /debts` and `PUT /debts/{id}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordPayload(Map<String, Value>);

impl RecordPayload {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a field (builder style)
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Coerces a string `amount` into a JSON number
    ///
    /// Blank strings become `0`; strings that do not parse as a finite
    /// number are left untouched for the server to reject.
    #[must_use]
    pub fn normalize(mut self) -> Self {
        if let Some(Value::String(raw)) = self.0.get("amount") {
            if let Some(number) = parse_amount(raw) {
                self.0.insert("amount".to_string(), Value::Number(number));
            }
        }
        self
    }
}

fn parse_amount(raw: &str) -> Option<Number> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(Number::from(0));
    }
    if let Ok(int) = trimmed.parse::<i64>() {
        return Some(Number::from(int));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .and_then(Number::from_f64)
}

impl From<Map<String, Value>> for RecordPayload {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl TryFrom<Value> for RecordPayload {
    type Error = DomainError;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(DomainError::InvalidPayload(format!(
                "expected a JSON object, got {other}"
            ))),
        }
    }
}

// ============================================================================
// CacheSnapshot
// ============================================================================

/// Locally persisted copy of the last known debt list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheSnapshot {
    /// Records in server order, with optimistic edits applied
    #[serde(default, deserialize_with = "null_as_empty")]
    pub data: Vec<Record>,
    /// When the snapshot was last written
    #[serde(default)]
    pub saved_at: Option<DateTime<Utc>>,
}

impl CacheSnapshot {
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
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
    fn test_record_deserializes_server_document() {
        let record: Record = serde_json::from_value(json!({
            "_id": "65f1",
            "name": "Ali",
            "phone": "0770",
            "boxName": "Box 3",
            "amount": 25000,
            "paid": true,
            "createdAt": "2025-01-01T00:00:00.000Z",
            "monthsDue": 1
        }))
        .unwrap();

        assert_eq!(record.id().as_str(), "65f1");
        assert!(record.paid());
        assert!(!record.is_optimistic());
        assert_eq!(record.field("boxName"), Some(&json!("Box 3")));
        assert_eq!(record.field("monthsDue"), Some(&json!(1)));
        assert!(record.field("_id").is_none());
    }

    #[test]
    fn test_record_paid_defaults_to_false() {
        let record: Record = serde_json::from_value(json!({"_id": "a"})).unwrap();
        assert!(!record.paid());

        let record: Record = serde_json::from_value(json!({"_id": "a", "paid": null})).unwrap();
        assert!(!record.paid());
    }

    #[test]
    fn test_record_without_id_is_rejected() {
        let result: Result<Record, _> = serde_json::from_value(json!({"name": "x"}));
        assert!(result.is_err());
    }

    #[test]
    fn test_optimistic_marker_serialization() {
        let confirmed = Record::new(rid("a"));
        let value = serde_json::to_value(&confirmed).unwrap();
        assert!(value.get("__optimistic").is_none());

        let payload = RecordPayload::new().with("name", "A");
        let pending = Record::optimistic(rid("offline-1"), &payload);
        let value = serde_json::to_value(&pending).unwrap();
        assert_eq!(value["__optimistic"], json!(true));
        assert_eq!(value["_id"], json!("offline-1"));
        assert_eq!(value["paid"], json!(false));
        assert_eq!(value["name"], json!("A"));
    }

    #[test]
    fn test_optimistic_payload_can_set_paid() {
        let payload = RecordPayload::new().with("paid", true);
        let record = Record::optimistic(rid("offline-2"), &payload);
        assert!(record.paid());
    }

    #[test]
    fn test_merge_keeps_identifier() {
        let mut record = Record::new(rid("keep-me")).with_field("name", "Old");
        let payload = RecordPayload::new()
            .with("_id", "hijack")
            .with("name", "New")
            .with("note", "later");
        record.merge_optimistic(&payload);

        assert_eq!(record.id().as_str(), "keep-me");
        assert_eq!(record.field("name"), Some(&json!("New")));
        assert_eq!(record.field("note"), Some(&json!("later")));
        assert!(record.is_optimistic());
    }

    #[test]
    fn test_normalize_amount_strings() {
        let p = RecordPayload::new().with("amount", "25000").normalize();
        assert_eq!(p.get("amount"), Some(&json!(25000)));

        let p = RecordPayload::new().with("amount", " 12.5 ").normalize();
        assert_eq!(p.get("amount"), Some(&json!(12.5)));

        let p = RecordPayload::new().with("amount", "").normalize();
        assert_eq!(p.get("amount"), Some(&json!(0)));

        let p = RecordPayload::new().with("amount", "abc").normalize();
        assert_eq!(p.get("amount"), Some(&json!("abc")));

        let p = RecordPayload::new().with("amount", 7).normalize();
        assert_eq!(p.get("amount"), Some(&json!(7)));

        let p = RecordPayload::new().with("name", "x").normalize();
        assert!(p.get("amount").is_none());
    }

    #[test]
    fn test_payload_from_non_object_fails() {
        assert!(RecordPayload::try_from(json!([1, 2])).is_err());
        assert!(RecordPayload::try_from(json!({"a": 1})).is_ok());
    }

    #[test]
    fn test_snapshot_null_data_is_empty() {
        let snapshot: CacheSnapshot =
            serde_json::from_value(json!({"data": null, "savedAt": null})).unwrap();
        assert!(snapshot.is_empty());
        assert!(snapshot.saved_at.is_none());
    }

    #[test]
    fn test_snapshot_wire_shape() {
        let snapshot = CacheSnapshot {
            data: vec![Record::new(rid("a"))],
            saved_at: None,
        };
        let value = serde_json::to_value(&snapshot).unwrap();
        assert!(value["data"].is_array());
        assert!(value.get("savedAt").is_some());
    }
}
