//! Oplog replication models.
//!
//! Every change to a collection is assigned a per-collection LSN by the
//! server. Readers page forward with `after_lsn`; replicas acknowledge their
//! progress with heartbeats, and the slowest live replica pins the retention
//! watermark below which entries may be purged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

use super::enums::{AttrType, OpType};
use super::null_as_default;
use super::record::{FieldMap, Record};
use crate::error::{Error, Result};

/// Log sequence number.
pub type Lsn = u64;

/// Single entry in the operation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OplogEntry {
    pub lsn: Lsn,
    pub timestamp: DateTime<Utc>,
    pub collection: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub doc_id: String,
    pub op_type: OpType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vector: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, JsonValue>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_doc: Option<Record>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vectors: Option<HashMap<String, Vec<f32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<FieldMap>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keyword_fields: Option<HashMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_fields: Option<HashMap<String, AttrType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,
    /// Target name of a `rename_collection` entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_name: Option<String>,
}

impl OplogEntry {
    /// Check the payload required by the entry's operation kind.
    pub fn validate_payload(&self) -> Result<()> {
        if self.op_type == OpType::RenameCollection
            && self.new_name.as_deref().map_or(true, str::is_empty)
        {
            return Err(Error::Decode(format!(
                "rename_collection entry at LSN {} on {} carries no new_name",
                self.lsn, self.collection
            )));
        }
        Ok(())
    }
}

/// Page of oplog entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetOplogResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub entries: Vec<OplogEntry>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_lsn: Lsn,
    #[serde(default, deserialize_with = "null_as_default")]
    pub count: u64,
}

impl GetOplogResponse {
    /// Check the ordering contract of a page fetched with `after_lsn`.
    ///
    /// Within one collection LSNs must be strictly ascending. When the page
    /// was requested for a single collection every entry must also lie above
    /// `after_lsn`. Entries of different collections are never compared.
    pub fn verify_order(&self, collection: Option<&str>, after_lsn: Lsn) -> Result<()> {
        let mut last_seen: HashMap<&str, Lsn> = HashMap::new();

        for entry in &self.entries {
            entry.validate_payload()?;

            if let Some(expected) = collection {
                if entry.collection != expected {
                    return Err(Error::Decode(format!(
                        "oplog page for {} contains entry of collection {}",
                        expected, entry.collection
                    )));
                }
                if entry.lsn <= after_lsn {
                    return Err(Error::Decode(format!(
                        "oplog entry LSN {} is not after requested LSN {}",
                        entry.lsn, after_lsn
                    )));
                }
            }

            if let Some(prev) = last_seen.insert(entry.collection.as_str(), entry.lsn) {
                if entry.lsn <= prev {
                    return Err(Error::Decode(format!(
                        "oplog entries for {} out of order: LSN {} follows {}",
                        entry.collection, entry.lsn, prev
                    )));
                }
            }
        }
        Ok(())
    }

    /// Highest LSN in the page, or `None` for an empty page.
    pub fn max_lsn(&self) -> Option<Lsn> {
        self.entries.iter().map(|e| e.lsn).max()
    }
}

/// Oplog status for a collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OplogStatus {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub last_lsn: Lsn,
    /// Watermark below which entries may have been purged.
    #[serde(default, deserialize_with = "null_as_default")]
    pub retention_lsn: Lsn,
    #[serde(default, deserialize_with = "null_as_default")]
    pub replica_count: u64,
}

impl OplogStatus {
    /// Whether reading after `after_lsn` may skip purged entries. When true the
    /// reader must re-synchronize from a full export instead of paging.
    pub fn may_have_gap(&self, after_lsn: Lsn) -> bool {
        after_lsn < self.retention_lsn
    }

    /// Number of entries a reader positioned at `after_lsn` still has to apply.
    pub fn lag(&self, after_lsn: Lsn) -> u64 {
        self.last_lsn.saturating_sub(after_lsn)
    }
}

/// Heartbeat body: last LSN a replica applied for a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateReplicaLsnRequest {
    pub collection: String,
    pub replica_id: String,
    pub lsn: Lsn,
}

/// Registration and unregistration body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicaRequest {
    pub replica_id: String,
}
