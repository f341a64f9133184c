//! Collection lifecycle models.

use serde::{Deserialize, Serialize};

use super::enums::{AttrType, StorageBackendType};
use super::null_as_default;

/// Metadata column declared on a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataColumnSchema {
    pub name: String,
    #[serde(rename = "type")]
    pub attr_type: AttrType,
}

/// A collection as reported by the collections listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_loaded: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub fields: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub searchable_fields: Vec<String>,
    #[serde(default)]
    pub metadata: Option<Vec<MetadataColumnSchema>>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub has_metadata_enabled: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub no_reference_storage: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub storage_type: StorageBackendType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reference_storage_type: StorageBackendType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_pq_enabled: bool,
}

/// Metadata storage backend offered by the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSupportInfo {
    pub support_metadata: bool,
    pub name: String,
    #[serde(rename = "type")]
    pub backend: StorageBackendType,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_default: bool,
}

/// Response for listing collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListCollectionsResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: Vec<Collection>,
    #[serde(default)]
    pub metadata_info: Option<Vec<MetadataSupportInfo>>,
}

impl ListCollectionsResponse {
    /// Look up a collection by name.
    pub fn find(&self, name: &str) -> Option<&Collection> {
        self.data.iter().find(|c| c.name == name)
    }
}

/// Request to add a new collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AddCollectionRequest {
    pub name: String,
    pub no_reference_storage: bool,
    pub has_metadata_storage: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_type: Option<StorageBackendType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_storage_type: Option<StorageBackendType>,
    /// Sent only when enabled.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub enable_pq: bool,
}

impl AddCollectionRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_metadata_storage(mut self, enabled: bool) -> Self {
        self.has_metadata_storage = enabled;
        self
    }

    pub fn without_reference_storage(mut self) -> Self {
        self.no_reference_storage = true;
        self
    }

    pub fn with_storage_type(mut self, storage: StorageBackendType) -> Self {
        self.storage_type = Some(storage);
        self
    }

    pub fn with_reference_storage_type(mut self, storage: StorageBackendType) -> Self {
        self.reference_storage_type = Some(storage);
        self
    }

    pub fn with_pq(mut self) -> Self {
        self.enable_pq = true;
        self
    }
}
