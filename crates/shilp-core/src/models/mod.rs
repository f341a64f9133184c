//! Request and response models for every Shilp endpoint.
//!
//! Requests omit optional keys the caller did not set; responses accept a key
//! being absent or `null` and fall back to an explicit default.

pub mod collection;
pub mod debug;
pub mod discovery;
pub mod enums;
pub mod ingest;
pub mod oplog;
pub mod record;
pub mod search;
pub mod storage;

use serde::{Deserialize, Deserializer, Serialize};

pub use collection::*;
pub use debug::*;
pub use discovery::*;
pub use enums::*;
pub use ingest::*;
pub use oplog::*;
pub use record::*;
pub use search::*;
pub use storage::*;

/// Decode a key that may be `null` into the type's default.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Standard response structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenericResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
}

/// Response for the health check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub success: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub version: String,
}
