//! Discovery registry models.
//!
//! The registry tracks one write replica and any number of read replicas per
//! account. A replica that reports `syncing` is still listed but must not
//! receive client traffic until it reports `ready`.

use serde::{Deserialize, Deserializer, Serialize};

use super::enums::{ReplicaType, SyncStatus};
use super::null_as_default;

fn default_true() -> bool {
    true
}

/// Replicas are healthy unless the registry says otherwise, `null` included.
fn null_as_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(true))
}

/// A registered Shilp instance as seen by the registry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replica {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_read: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_write: bool,
    #[serde(default = "default_true", deserialize_with = "null_as_true")]
    pub is_healthy: bool,
    /// True while the replica catches up; excluded from traffic.
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_syncing: bool,
}

impl Replica {
    /// Healthy and not syncing.
    pub fn accepts_traffic(&self) -> bool {
        self.is_healthy && !self.is_syncing
    }

    fn is_unset(&self) -> bool {
        self.id.is_empty() && self.address.is_empty()
    }
}

/// An absent, `null` or empty-object write replica all mean "no write replica".
fn deserialize_write_replica<'de, D>(deserializer: D) -> Result<Option<Replica>, D::Error>
where
    D: Deserializer<'de>,
{
    let replica = Option::<Replica>::deserialize(deserializer)?;
    Ok(replica.filter(|r| !r.is_unset()))
}

/// Registry view for an account.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    #[serde(
        default,
        deserialize_with = "deserialize_write_replica",
        skip_serializing_if = "Option::is_none"
    )]
    pub write_replica: Option<Replica>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub read_replicas: Vec<Replica>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub available: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub total: u32,
}

impl Status {
    /// Read replicas that may receive client requests, in registry order.
    pub fn traffic_eligible_read_replicas(&self) -> Vec<&Replica> {
        self.read_replicas
            .iter()
            .filter(|r| r.accepts_traffic())
            .collect()
    }

    /// The write replica, if one is registered and may receive mutations.
    pub fn routable_write_replica(&self) -> Option<&Replica> {
        self.write_replica.as_ref().filter(|r| r.accepts_traffic())
    }

    /// Read replica registered at `address`.
    pub fn read_replica(&self, address: &str) -> Option<&Replica> {
        self.read_replicas.iter().find(|r| r.address == address)
    }
}

/// Proxy layer statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub active_proxies: u32,
    #[serde(default, deserialize_with = "null_as_default")]
    pub targets: Vec<String>,
}

/// Snapshot returned by the stats endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryStats {
    #[serde(default, deserialize_with = "null_as_default")]
    pub registry: Status,
    #[serde(default, deserialize_with = "null_as_default")]
    pub proxy: ProxyStats,
}

/// Register/unregister body for a Shilp instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceRegistration {
    pub account_id: String,
    pub address: String,
    pub id: String,
    pub is_read: bool,
    pub is_write: bool,
}

impl ServiceRegistration {
    /// Capability flags are derived from `role`.
    pub fn new(
        account_id: impl Into<String>,
        address: impl Into<String>,
        service_id: impl Into<String>,
        role: ReplicaType,
    ) -> Self {
        Self {
            account_id: account_id.into(),
            address: address.into(),
            id: service_id.into(),
            is_read: role.is_read(),
            is_write: role.is_write(),
        }
    }
}

/// Sync status update body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncStatusUpdate {
    pub account_id: String,
    pub address: String,
    pub status: SyncStatus,
}

/// Register/unregister body for a text-embedding-inference service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeiServiceRegistration {
    pub account_id: String,
    pub address: String,
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_registration_flags_by_role() {
        let single = ServiceRegistration::new("acct", "10.0.0.1:3000", "s1", ReplicaType::SingleNode);
        assert!(single.is_read && single.is_write);

        let read = ServiceRegistration::new("acct", "10.0.0.2:3000", "s2", ReplicaType::ReadReplica);
        assert!(read.is_read && !read.is_write);

        let write =
            ServiceRegistration::new("acct", "10.0.0.3:3000", "s3", ReplicaType::WriteReplica);
        assert!(!write.is_read && write.is_write);

        assert_eq!(
            serde_json::to_value(&write).unwrap(),
            json!({
                "account_id": "acct",
                "address": "10.0.0.3:3000",
                "id": "s3",
                "is_read": false,
                "is_write": true
            })
        );
    }

    #[test]
    fn test_replica_health_defaults_to_true() {
        let absent: Replica =
            serde_json::from_value(json!({"id": "r1", "address": "10.0.0.1:3000"})).unwrap();
        assert!(absent.is_healthy);

        let null: Replica = serde_json::from_value(json!({
            "id": "r1",
            "address": "10.0.0.1:3000",
            "is_healthy": null
        }))
        .unwrap();
        assert!(null.is_healthy);
        assert!(null.accepts_traffic());

        let down: Replica =
            serde_json::from_value(json!({"id": "r1", "is_healthy": false})).unwrap();
        assert!(!down.accepts_traffic());
    }

    #[test]
    fn test_stats_with_empty_write_replica() {
        let stats: DiscoveryStats = serde_json::from_value(json!({
            "registry": {"write_replica": {}, "read_replicas": [], "available": 0, "total": 0},
            "proxy": {"active_proxies": 1, "targets": []}
        }))
        .unwrap();
        assert!(stats.registry.write_replica.is_none());
        assert_eq!(stats.proxy.active_proxies, 1);
    }

    #[test]
    fn test_stats_with_missing_sections() {
        let stats: DiscoveryStats = serde_json::from_value(json!({})).unwrap();
        assert!(stats.registry.write_replica.is_none());
        assert!(stats.registry.read_replicas.is_empty());
        assert!(stats.proxy.targets.is_empty());
    }

    #[test]
    fn test_syncing_replica_is_not_traffic_eligible() {
        let status: Status = serde_json::from_value(json!({
            "write_replica": {"id": "w", "address": "w:3000", "is_write": true},
            "read_replicas": [
                {"id": "r1", "address": "r1:3000", "is_read": true, "is_syncing": true},
                {"id": "r2", "address": "r2:3000", "is_read": true, "is_syncing": false},
                {"id": "r3", "address": "r3:3000", "is_read": true, "is_healthy": false}
            ],
            "available": 1,
            "total": 3
        }))
        .unwrap();

        let eligible: Vec<&str> = status
            .traffic_eligible_read_replicas()
            .iter()
            .map(|r| r.id.as_str())
            .collect();
        assert_eq!(eligible, vec!["r2"]);
        assert_eq!(status.routable_write_replica().unwrap().id, "w");
        assert!(status.read_replica("r1:3000").unwrap().is_syncing);
    }

    #[test]
    fn test_sync_status_body() {
        let body = SyncStatusUpdate {
            account_id: "acct".to_string(),
            address: "r1:3000".to_string(),
            status: SyncStatus::Syncing,
        };
        assert_eq!(serde_json::to_value(body).unwrap()["status"], json!("syncing"));
    }
}
