//! Data-plane client.
//!
//! [`ShilpClient`] is a thin typed layer over [`HttpTransport`]. Its
//! operations are spread over `collections.rs`, `data.rs` and `debug.rs`.

use reqwest::Client;
use tracing::{info, instrument};

use shilp_core::{Error, HealthResponse, Result};

use crate::config::ClientConfig;
use crate::oplog::OplogClient;
use crate::transport::HttpTransport;

/// Client for one Shilp server.
#[derive(Debug, Clone)]
pub struct ShilpClient {
    pub(crate) transport: HttpTransport,
    oplog: OplogClient,
}

impl ShilpClient {
    /// Create a client from configuration.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        info!(base_url = %config.base_url, "Initializing Shilp client");
        Ok(Self::from_transport(transport))
    }

    /// Create a client for `base_url` with default settings.
    pub fn connect(base_url: impl Into<String>) -> Result<Self> {
        Self::new(ClientConfig::new(base_url))
    }

    /// Create from `SHILP_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::from_env())
    }

    /// Reuse an existing `reqwest::Client`.
    pub fn with_client(client: Client, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_transport(HttpTransport::with_client(
            client, &config,
        )))
    }

    fn from_transport(transport: HttpTransport) -> Self {
        Self {
            oplog: OplogClient::from_transport(transport.clone()),
            transport,
        }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Oplog client sharing this client's connection pool.
    ///
    /// Every call, and every clone of this client, sees the same heartbeat
    /// ledger.
    pub fn oplog(&self) -> &OplogClient {
        &self.oplog
    }

    /// Check server health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<HealthResponse> {
        self.transport.get_json("/health", &[]).await
    }
}

/// Reject an empty identifier before it reaches a URL.
pub(crate) fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::Validation(format!("{} cannot be empty", what)));
    }
    Ok(())
}
