//! Oplog replication client.
//!
//! Replicas page through the operation log with [`OplogClient::get_entries`]
//! and acknowledge progress with [`OplogClient::heartbeat`]. The client keeps
//! a ledger of the last LSN acknowledged per `(replica, collection)` so that
//! a heartbeat can never move a replica's position backwards. Clones of an
//! [`OplogClient`] share one ledger.

use reqwest::Method;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use shilp_core::defaults::OPLOG_PATH;
use shilp_core::{
    Error, GenericResponse, GetOplogResponse, Lsn, OplogStatus, ReplicaRequest, Result,
    UpdateReplicaLsnRequest,
};

use crate::client::require_non_empty;
use crate::config::ClientConfig;
use crate::transport::HttpTransport;

type LedgerKey = (String, String);
type Ledger = Arc<Mutex<HashMap<LedgerKey, Position>>>;

/// Heartbeat bookkeeping for one `(replica, collection)` pair.
#[derive(Debug, Default)]
struct Position {
    acked: Option<Lsn>,
    in_flight: Vec<Lsn>,
}

impl Position {
    /// Lowest LSN a new heartbeat may carry: nothing below an acknowledged
    /// or still-pending one.
    fn floor(&self) -> Lsn {
        self.in_flight
            .iter()
            .copied()
            .chain(self.acked)
            .max()
            .unwrap_or(0)
    }
}

fn lock(ledger: &Ledger) -> MutexGuard<'_, HashMap<LedgerKey, Position>> {
    // The map is never left half-updated, so a poisoned lock is still usable.
    ledger.lock().unwrap_or_else(|e| e.into_inner())
}

/// A heartbeat reserved in the ledger while its request is outstanding.
///
/// Dropping it releases the reservation, so a cancelled or failed request
/// leaves only the acknowledged position behind.
struct Reservation {
    ledger: Ledger,
    key: LedgerKey,
    lsn: Lsn,
    acked: bool,
}

impl Drop for Reservation {
    fn drop(&mut self) {
        let mut ledger = lock(&self.ledger);
        let Some(pos) = ledger.get_mut(&self.key) else {
            return;
        };
        if let Some(i) = pos.in_flight.iter().position(|&l| l == self.lsn) {
            pos.in_flight.swap_remove(i);
        }
        if self.acked {
            pos.acked = Some(pos.acked.map_or(self.lsn, |a| a.max(self.lsn)));
        }
        if pos.acked.is_none() && pos.in_flight.is_empty() {
            ledger.remove(&self.key);
        }
    }
}

/// Outcome of one catch-up step.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncStep {
    /// Entries after the requested LSN; may be empty when caught up.
    Entries(GetOplogResponse),
    /// Entries the reader needs may already be purged. Restore from a full
    /// export, then resume paging from `retention_lsn`.
    ResyncRequired { retention_lsn: Lsn },
}

/// Client for the oplog endpoints.
#[derive(Debug, Clone)]
pub struct OplogClient {
    transport: HttpTransport,
    ledger: Ledger,
}

impl OplogClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self::from_transport(HttpTransport::new(&config)?))
    }

    pub fn from_transport(transport: HttpTransport) -> Self {
        Self {
            transport,
            ledger: Ledger::default(),
        }
    }

    fn ledger(&self) -> MutexGuard<'_, HashMap<LedgerKey, Position>> {
        lock(&self.ledger)
    }

    /// Check `lsn` against the floor and hold it as pending, in one step.
    fn reserve(&self, replica_id: &str, collection: &str, lsn: Lsn) -> Result<Reservation> {
        let key = (replica_id.to_string(), collection.to_string());
        let mut ledger = self.ledger();
        let pos = ledger.entry(key.clone()).or_default();
        let floor = pos.floor();
        if lsn < floor {
            return Err(Error::InvalidLsn {
                replica_id: replica_id.to_string(),
                collection: collection.to_string(),
                lsn,
                last_acked: floor,
            });
        }
        pos.in_flight.push(lsn);
        Ok(Reservation {
            ledger: Arc::clone(&self.ledger),
            key,
            lsn,
            acked: false,
        })
    }

    /// Last LSN the server accepted from `replica_id` for `collection`.
    ///
    /// `None` when no heartbeat for the pair has been acknowledged yet.
    pub fn last_acked(&self, replica_id: &str, collection: &str) -> Option<Lsn> {
        self.ledger()
            .get(&(replica_id.to_string(), collection.to_string()))
            .and_then(|pos| pos.acked)
    }

    /// Fetch entries with LSN greater than `after_lsn`.
    ///
    /// An empty `collection` reads every collection and `limit` 0 leaves the
    /// page size to the server. The page is checked for ordering before it is
    /// returned.
    #[instrument(skip(self))]
    pub async fn get_entries(
        &self,
        collection: &str,
        after_lsn: Lsn,
        limit: u32,
    ) -> Result<GetOplogResponse> {
        let mut query = vec![("after_lsn", after_lsn.to_string())];
        if !collection.is_empty() {
            query.push(("collection", collection.to_string()));
        }
        if limit > 0 {
            query.push(("limit", limit.to_string()));
        }

        let page: GetOplogResponse = self
            .transport
            .get_json(&format!("{}/", OPLOG_PATH), &query)
            .await?;

        let filter = (!collection.is_empty()).then_some(collection);
        page.verify_order(filter, after_lsn)?;

        debug!(
            entries = page.entries.len(),
            last_lsn = page.last_lsn,
            "Fetched oplog page"
        );
        Ok(page)
    }

    /// Acknowledge that `replica_id` applied `collection` up to `lsn`.
    ///
    /// Fails with [`Error::InvalidLsn`] without contacting the server when
    /// `lsn` is below the last acknowledged value, or below a heartbeat for
    /// the same pair that is still in flight. Repeating the same LSN is
    /// accepted.
    #[instrument(skip(self))]
    pub async fn heartbeat(
        &self,
        collection: &str,
        replica_id: &str,
        lsn: Lsn,
    ) -> Result<GenericResponse> {
        require_non_empty("collection name", collection)?;
        require_non_empty("replica id", replica_id)?;

        let mut reservation = self.reserve(replica_id, collection, lsn).map_err(|e| {
            warn!(replica_id, collection, lsn, error = %e, "Rejected backwards heartbeat");
            e
        })?;

        let body = UpdateReplicaLsnRequest {
            collection: collection.to_string(),
            replica_id: replica_id.to_string(),
            lsn,
        };
        let resp: GenericResponse = self
            .transport
            .exchange_json(
                Method::POST,
                &format!("{}/heartbeat", OPLOG_PATH),
                Some(&body),
                &[],
            )
            .await?;

        reservation.acked = true;
        Ok(resp)
    }

    /// Register a replica so it participates in retention.
    ///
    /// Registering again keeps any previously acknowledged positions.
    #[instrument(skip(self))]
    pub async fn register_replica(&self, replica_id: &str) -> Result<GenericResponse> {
        require_non_empty("replica id", replica_id)?;
        let body = ReplicaRequest {
            replica_id: replica_id.to_string(),
        };
        let resp = self
            .transport
            .exchange_json(
                Method::POST,
                &format!("{}/register", OPLOG_PATH),
                Some(&body),
                &[],
            )
            .await?;
        info!(replica_id, "Replica registered");
        Ok(resp)
    }

    /// Unregister a replica and forget its acknowledged positions.
    #[instrument(skip(self))]
    pub async fn unregister_replica(&self, replica_id: &str) -> Result<GenericResponse> {
        require_non_empty("replica id", replica_id)?;
        let body = ReplicaRequest {
            replica_id: replica_id.to_string(),
        };
        let resp = self
            .transport
            .exchange_json(
                Method::POST,
                &format!("{}/unregister", OPLOG_PATH),
                Some(&body),
                &[],
            )
            .await?;

        self.ledger().retain(|(replica, _), _| replica != replica_id);
        info!(replica_id, "Replica unregistered");
        Ok(resp)
    }

    /// Log positions and retention watermark for a collection.
    #[instrument(skip(self))]
    pub async fn get_status(&self, collection: &str) -> Result<OplogStatus> {
        require_non_empty("collection name", collection)?;
        self.transport
            .get_json(
                &format!("{}/status", OPLOG_PATH),
                &[("collection", collection.to_string())],
            )
            .await
    }

    /// Fetch the next page for a reader at `after_lsn`, first checking that
    /// no entry it needs has been purged.
    #[instrument(skip(self))]
    pub async fn catch_up(&self, collection: &str, after_lsn: Lsn, limit: u32) -> Result<SyncStep> {
        let status = self.get_status(collection).await?;
        if status.may_have_gap(after_lsn) {
            warn!(
                collection,
                after_lsn,
                retention_lsn = status.retention_lsn,
                "Oplog position below retention watermark, resync required"
            );
            return Ok(SyncStep::ResyncRequired {
                retention_lsn: status.retention_lsn,
            });
        }

        let page = self.get_entries(collection, after_lsn, limit).await?;
        Ok(SyncStep::Entries(page))
    }
}
