//! Storage browsing and embedding model listing.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::HashMap;

use super::enums::IngestSourceType;
use super::null_as_default;
use crate::error::{Error, Result};

/// Item in a storage listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageItem {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_dir: bool,
}

/// Response for listing storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListStorageResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: HashMap<String, Vec<StorageItem>>,
}

/// Options for reading the first rows of a document.
///
/// `limit` and `skip` are unsigned; zero means "server default" and is not sent.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileReaderOptions {
    pub source: Option<IngestSourceType>,
    pub limit: u32,
    pub skip: u32,
    /// MongoDB query document. Only sent when `source` is MongoDB.
    pub mongo_filter: Option<JsonValue>,
}

impl FileReaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: IngestSourceType) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }

    pub fn with_skip(mut self, skip: u32) -> Self {
        self.skip = skip;
        self
    }

    pub fn with_mongo_filter(mut self, filter: JsonValue) -> Self {
        self.mongo_filter = Some(filter);
        self
    }

    /// Query parameters for reading `path`.
    pub fn to_query(&self, path: &str) -> Result<Vec<(&'static str, String)>> {
        if path.is_empty() {
            return Err(Error::Validation("path cannot be empty".to_string()));
        }

        let mut params = vec![("path", path.to_string())];
        if let Some(source) = self.source {
            params.push(("source", source.as_str().to_string()));
        }
        if self.limit > 0 {
            params.push(("rows", self.limit.to_string()));
        }
        if self.skip > 0 {
            params.push(("skip", self.skip.to_string()));
        }
        if self.source == Some(IngestSourceType::Mongodb) {
            if let Some(filter) = self.mongo_filter.as_ref().filter(|f| !is_empty_json(f)) {
                params.push(("mongo_filter", serde_json::to_string(filter)?));
            }
        }
        Ok(params)
    }
}

fn is_empty_json(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => true,
        JsonValue::Object(map) => map.is_empty(),
        _ => false,
    }
}

/// Response for reading document contents: rows of column name to cell text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadDocumentResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<HashMap<String, JsonValue>>,
}

/// Embedding model offered by a provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingModel {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_default: bool,
}

/// Embedding provider with its models.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbeddingProvider {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_default: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub models: Vec<EmbeddingModel>,
}

/// Response for listing embedding models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListEmbeddingModelsResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<EmbeddingProvider>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub supports_distributed_embedding: bool,
}

impl ListEmbeddingModelsResponse {
    /// The default provider and its default model, if the server marks one.
    pub fn default_model(&self) -> Option<(&str, &str)> {
        let provider = self.data.iter().find(|p| p.is_default)?;
        let model = provider.models.iter().find(|m| m.is_default)?;
        Some((provider.name.as_str(), model.name.as_str()))
    }
}
