//! Closed enumerations shared by every endpoint.
//!
//! Integer-coded enums travel as small integers on the wire and refuse to
//! decode unknown values. String-coded enums use snake_case names.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// An integer or string that does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized {kind} value: {value}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: i64,
}

/// Declares an integer-coded wire enum with `From<T> for i64` and
/// `TryFrom<i64> for T`, wired into serde via `into`/`try_from`.
macro_rules! wire_int_enum {
    (
        $(#[$meta:meta])*
        $name:ident as $kind:literal {
            $( $(#[$vmeta:meta])* $variant:ident = $code:literal => $label:literal, )+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "i64", try_from = "i64")]
        pub enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// Every variant in wire order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Integer used on the wire.
            pub fn code(self) -> i64 {
                match self {
                    $( $name::$variant => $code, )+
                }
            }
        }

        impl From<$name> for i64 {
            fn from(value: $name) -> i64 {
                value.code()
            }
        }

        impl TryFrom<i64> for $name {
            type Error = UnknownVariant;

            fn try_from(value: i64) -> Result<Self, Self::Error> {
                match value {
                    $( $code => Ok($name::$variant), )+
                    _ => Err(UnknownVariant { kind: $kind, value }),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let label = match self {
                    $( $name::$variant => $label, )+
                };
                f.write_str(label)
            }
        }
    };
}

wire_int_enum! {
    /// Type of a metadata attribute.
    AttrType as "attribute type" {
        Int64 = 0 => "INT64",
        Float64 = 1 => "FLOAT64",
        String = 2 => "STRING",
        Bool = 3 => "BOOL",
    }
}

wire_int_enum! {
    /// Comparison applied by a filter expression.
    FilterOp as "filter operator" {
        Equals = 0 => "EQUALS",
        NotEquals = 1 => "NOT_EQUALS",
        GreaterThan = 2 => "GREATER_THAN",
        GreaterThanOrEqual = 3 => "GREATER_THAN_OR_EQUAL",
        LessThan = 4 => "LESS_THAN",
        LessThanOrEqual = 5 => "LESS_THAN_OR_EQUAL",
        In = 6 => "IN",
        NotIn = 7 => "NOT_IN",
    }
}

impl FilterOp {
    /// `IN` and `NOT_IN` compare against a value set instead of a single value.
    pub fn is_set_operator(self) -> bool {
        matches!(self, FilterOp::In | FilterOp::NotIn)
    }
}

wire_int_enum! {
    /// Sort direction.
    SortOrder as "sort order" {
        Ascending = 0 => "ASCENDING",
        Descending = 1 => "DESCENDING",
    }
}

wire_int_enum! {
    /// Backend holding collection data or reference documents.
    StorageBackendType as "storage backend" {
        /// Server chooses its configured default.
        Unset = -1 => "UNSET",
        File = 1 => "FILE",
        ObjectStore = 2 => "OBJECT_STORE",
    }
}

impl Default for StorageBackendType {
    fn default() -> Self {
        StorageBackendType::Unset
    }
}

wire_int_enum! {
    /// Role of a Shilp instance in a replicated deployment.
    ReplicaType as "replica type" {
        ReadReplica = 0 => "READ_REPLICA",
        WriteReplica = 1 => "WRITE_REPLICA",
        /// Simultaneously read- and write-capable.
        SingleNode = 2 => "SINGLE_NODE",
    }
}

impl ReplicaType {
    /// Whether instances with this role serve read traffic.
    pub fn is_read(self) -> bool {
        matches!(self, ReplicaType::ReadReplica | ReplicaType::SingleNode)
    }

    /// Whether instances with this role accept mutations.
    pub fn is_write(self) -> bool {
        matches!(self, ReplicaType::WriteReplica | ReplicaType::SingleNode)
    }
}

/// Operation kind recorded in the oplog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpType {
    Insert,
    Update,
    Delete,
    DropCollection,
    RenameCollection,
}

impl OpType {
    /// Operations that affect a whole collection rather than one document.
    pub fn is_collection_level(self) -> bool {
        matches!(self, OpType::DropCollection | OpType::RenameCollection)
    }
}

/// Sync status reported by a replica to the discovery registry.
///
/// `Syncing` gates the replica out of client traffic; `Ready` lets it back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Ready,
    Syncing,
}

/// Source an ingestion job reads from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IngestSourceType {
    File,
    Mongodb,
}

impl IngestSourceType {
    /// Name used in query parameters.
    pub fn as_str(self) -> &'static str {
        match self {
            IngestSourceType::File => "file",
            IngestSourceType::Mongodb => "mongodb",
        }
    }
}
