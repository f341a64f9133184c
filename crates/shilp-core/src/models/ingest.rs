//! Bulk ingestion from files or MongoDB.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::enums::{AttrType, IngestSourceType};
use super::null_as_default;

/// Request to ingest data into a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestRequest {
    pub collection_name: String,

    // Source configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_type: Option<IngestSourceType>,

    // MongoDB source configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mongo_collection: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mongo_fetch_batch_size: Option<u32>,

    // Common configuration
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata_fields: Option<HashMap<String, AttrType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiry_field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ingestion_batch_size: Option<u32>,
}

impl IngestRequest {
    /// Ingest a previously uploaded file.
    pub fn from_file(collection: impl Into<String>, file_path: impl Into<String>) -> Self {
        Self {
            collection_name: collection.into(),
            file_path: Some(file_path.into()),
            source_type: Some(IngestSourceType::File),
            ..Default::default()
        }
    }

    /// Ingest a MongoDB collection.
    pub fn from_mongo(
        collection: impl Into<String>,
        database: impl Into<String>,
        mongo_collection: impl Into<String>,
    ) -> Self {
        Self {
            collection_name: collection.into(),
            source_type: Some(IngestSourceType::Mongodb),
            database_name: Some(database.into()),
            mongo_collection: Some(mongo_collection.into()),
            ..Default::default()
        }
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_id_field(mut self, field: impl Into<String>) -> Self {
        self.id_field = Some(field.into());
        self
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.ingestion_batch_size = Some(size);
        self
    }
}

/// Response for data ingestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default)]
    pub details: Option<Vec<String>>,
}

/// Response listing the ingestion sources the server supports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListIngestionSourcesResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<IngestSourceType>,
}
