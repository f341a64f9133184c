//! Centralized default constants for the Shilp client.
//!
//! Client crates reference these constants instead of defining their own
//! magic numbers.

// =============================================================================
// CONNECTION
// =============================================================================

/// Default Shilp server base URL.
pub const BASE_URL: &str = "http://localhost:3000";

/// Default Shilp discovery server base URL.
pub const DISCOVERY_URL: &str = "http://localhost:8080";

/// Per-call request timeout in seconds.
pub const TIMEOUT_SECS: u64 = 30;

/// TCP connect timeout in seconds.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("shilp-rs/", env!("CARGO_PKG_VERSION"));

/// Requests slower than this are logged at WARN.
pub const SLOW_REQUEST_MS: u64 = 5_000;

// =============================================================================
// STREAMING
// =============================================================================

/// Capacity of the channel between an event reader task and its consumer.
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Multipart form field name used for file uploads.
pub const UPLOAD_FIELD: &str = "file";

// =============================================================================
// API PATHS
// =============================================================================

/// Collection management endpoints.
pub const COLLECTIONS_PATH: &str = "/api/collections/v1";

/// Data, search and storage endpoints.
pub const DATA_PATH: &str = "/api/data/v1";

/// Oplog replication endpoints.
pub const OPLOG_PATH: &str = "/api/oplog/v1";

/// Discovery endpoints for Shilp services.
pub const DISCOVERY_SHILP_PATH: &str = "/api/v1/discovery/shilp";

/// Discovery endpoints for text-embedding-inference services.
pub const DISCOVERY_TEI_PATH: &str = "/api/v1/discovery/tei";
