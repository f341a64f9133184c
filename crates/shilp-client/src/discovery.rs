//! Discovery registry client.
//!
//! The discovery server tracks which Shilp instances serve an account and in
//! which role. Routing decisions belong to the caller: fetch a snapshot with
//! [`DiscoveryClient::get_stats`] and pick from
//! [`Status::traffic_eligible_read_replicas`](shilp_core::Status::traffic_eligible_read_replicas).

use reqwest::Method;
use serde::Serialize;
use tracing::{debug, info, instrument};

use shilp_core::defaults::{DISCOVERY_SHILP_PATH, DISCOVERY_TEI_PATH};
use shilp_core::{
    DiscoveryStats, Error, GenericResponse, ReplicaType, Result, ServiceRegistration, SyncStatus,
    SyncStatusUpdate, TeiServiceRegistration,
};

use crate::client::require_non_empty;
use crate::config::ClientConfig;
use crate::transport::HttpTransport;

/// Client for the discovery registry.
#[derive(Debug, Clone)]
pub struct DiscoveryClient {
    transport: HttpTransport,
}

impl DiscoveryClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = HttpTransport::new(&config)?;
        info!(base_url = %config.base_url, "Initializing discovery client");
        Ok(Self { transport })
    }

    /// Create from `SHILP_DISCOVERY_URL` and the shared `SHILP_*` settings.
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::discovery_from_env())
    }

    pub fn from_transport(transport: HttpTransport) -> Self {
        Self { transport }
    }

    /// Registry and proxy snapshot for an account.
    #[instrument(skip(self))]
    pub async fn get_stats(&self, account_id: &str) -> Result<DiscoveryStats> {
        require_non_empty("account id", account_id)?;
        let stats: DiscoveryStats = self
            .transport
            .get_json(
                &format!("{}/stats", DISCOVERY_SHILP_PATH),
                &[("account_id", account_id.to_string())],
            )
            .await?;
        debug!(
            has_write_replica = stats.registry.write_replica.is_some(),
            read_replicas = stats.registry.read_replicas.len(),
            active_proxies = stats.proxy.active_proxies,
            "Fetched discovery stats"
        );
        Ok(stats)
    }

    /// Report whether the instance at `address` is ready or still syncing.
    ///
    /// A syncing replica stays registered but receives no traffic.
    #[instrument(skip(self))]
    pub async fn update_sync_status(
        &self,
        account_id: &str,
        address: &str,
        status: SyncStatus,
    ) -> Result<GenericResponse> {
        require_non_empty("account id", account_id)?;
        require_non_empty("address", address)?;
        let body = SyncStatusUpdate {
            account_id: account_id.to_string(),
            address: address.to_string(),
            status,
        };
        self.send(Method::PUT, &format!("{}/sync", DISCOVERY_SHILP_PATH), &body, address)
            .await
    }

    /// Register a Shilp instance. Registering the same service twice is a no-op
    /// on the server.
    #[instrument(skip(self))]
    pub async fn register_service(
        &self,
        account_id: &str,
        address: &str,
        service_id: &str,
        role: ReplicaType,
    ) -> Result<GenericResponse> {
        let body = registration(account_id, address, service_id, role)?;
        let resp = self
            .send(
                Method::POST,
                &format!("{}/register", DISCOVERY_SHILP_PATH),
                &body,
                service_id,
            )
            .await?;
        info!(service_id, address, %role, "Service registered");
        Ok(resp)
    }

    #[instrument(skip(self))]
    pub async fn unregister_service(
        &self,
        account_id: &str,
        address: &str,
        service_id: &str,
        role: ReplicaType,
    ) -> Result<GenericResponse> {
        let body = registration(account_id, address, service_id, role)?;
        let resp = self
            .send(
                Method::DELETE,
                &format!("{}/unregister", DISCOVERY_SHILP_PATH),
                &body,
                service_id,
            )
            .await?;
        info!(service_id, address, "Service unregistered");
        Ok(resp)
    }

    /// Register a text-embedding-inference service.
    #[instrument(skip(self))]
    pub async fn register_tei_service(
        &self,
        account_id: &str,
        address: &str,
        service_id: &str,
    ) -> Result<GenericResponse> {
        let body = tei_registration(account_id, address, service_id)?;
        self.send(
            Method::POST,
            &format!("{}/register", DISCOVERY_TEI_PATH),
            &body,
            service_id,
        )
        .await
    }

    #[instrument(skip(self))]
    pub async fn unregister_tei_service(
        &self,
        account_id: &str,
        address: &str,
        service_id: &str,
    ) -> Result<GenericResponse> {
        let body = tei_registration(account_id, address, service_id)?;
        self.send(
            Method::DELETE,
            &format!("{}/unregister", DISCOVERY_TEI_PATH),
            &body,
            service_id,
        )
        .await
    }

    /// Send `body`, mapping a 404 to [`Error::NotFound`] for `subject`.
    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: &B,
        subject: &str,
    ) -> Result<GenericResponse> {
        match self
            .transport
            .exchange_json(method, path, Some(body), &[])
            .await
        {
            Err(Error::Api { status: 404, body }) => Err(Error::NotFound(format!(
                "{} is not registered: {}",
                subject, body
            ))),
            other => other,
        }
    }
}

fn registration(
    account_id: &str,
    address: &str,
    service_id: &str,
    role: ReplicaType,
) -> Result<ServiceRegistration> {
    require_non_empty("account id", account_id)?;
    require_non_empty("address", address)?;
    require_non_empty("service id", service_id)?;
    Ok(ServiceRegistration::new(account_id, address, service_id, role))
}

fn tei_registration(
    account_id: &str,
    address: &str,
    service_id: &str,
) -> Result<TeiServiceRegistration> {
    require_non_empty("account id", account_id)?;
    require_non_empty("address", address)?;
    require_non_empty("service id", service_id)?;
    Ok(TeiServiceRegistration {
        account_id: account_id.to_string(),
        address: address.to_string(),
        id: service_id.to_string(),
    })
}
