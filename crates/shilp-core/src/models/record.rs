//! Records and record insertion.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use super::enums::AttrType;
use super::null_as_default;

/// Field map of a record: field name to arbitrary JSON value.
pub type FieldMap = Map<String, JsonValue>;

/// A stored record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: FieldMap,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_fields: Option<HashMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_fields: Option<HashMap<String, AttrType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vectors: Option<HashMap<String, Vec<f32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dist: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nodes: Option<Vec<String>>,
    /// Epoch seconds; `0` means the record never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
}

impl Record {
    /// Whether the record carries an expiry.
    pub fn expires(&self) -> bool {
        self.expiry.map_or(false, |e| e != 0)
    }
}

/// Record echoed back by the insert endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordData {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub expiry: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: FieldMap,
    #[serde(default)]
    pub keyword_fields: Option<HashMap<String, bool>>,
    #[serde(default)]
    pub metadata_fields: Option<HashMap<String, AttrType>>,
}

/// Request to insert a record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InsertRecordRequest {
    pub collection: String,
    pub record: FieldMap,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    /// Stable identifier. Supplying one makes retries safe.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_fields: Option<HashMap<String, AttrType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl InsertRecordRequest {
    pub fn new(collection: impl Into<String>, record: FieldMap) -> Self {
        Self {
            collection: collection.into(),
            record,
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_expiry(mut self, expiry: i64) -> Self {
        self.expiry = Some(expiry);
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_keyword_fields(mut self, fields: Vec<String>) -> Self {
        self.keyword_fields = Some(fields);
        self
    }

    pub fn with_metadata_field(mut self, name: impl Into<String>, attr_type: AttrType) -> Self {
        self.metadata_fields
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), attr_type);
        self
    }

    pub fn with_embedding(
        mut self,
        provider: impl Into<String>,
        model: Option<String>,
    ) -> Self {
        self.embedding_provider = Some(provider.into());
        self.model = model;
        self
    }
}

/// Response for inserting a record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertRecordResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub record: Option<RecordData>,
    #[serde(default)]
    pub remaining_records: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fields(value: JsonValue) -> FieldMap {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_insert_request_omits_unset_keys() {
        let req = InsertRecordRequest::new("docs", fields(json!({"title": "AI"})));
        let body = serde_json::to_value(req).unwrap();
        assert_eq!(body, json!({"collection": "docs", "record": {"title": "AI"}}));
    }

    #[test]
    fn test_insert_request_metadata_types_are_integers() {
        let req = InsertRecordRequest::new("docs", fields(json!({"rating": 4.5})))
            .with_id("a")
            .with_expiry(0)
            .with_metadata_field("rating", AttrType::Float64);
        let body = serde_json::to_value(req).unwrap();
        assert_eq!(body["id"], json!("a"));
        assert_eq!(body["expiry"], json!(0));
        assert_eq!(body["metadata_fields"], json!({"rating": 1}));
    }

    #[test]
    fn test_insert_response_without_record() {
        let resp: InsertRecordResponse =
            serde_json::from_value(json!({"success": true, "message": "queued"})).unwrap();
        assert!(resp.record.is_none());
        assert!(resp.remaining_records.is_none());
    }

    #[test]
    fn test_record_expiry_zero_never_expires() {
        let record: Record =
            serde_json::from_value(json!({"id": "a", "fields": {}, "expiry": 0})).unwrap();
        assert!(!record.expires());
        let record: Record =
            serde_json::from_value(json!({"id": "a", "expiry": 1_700_000_000})).unwrap();
        assert!(record.expires());
    }
}
