//! API resource models: apps, processes, stats, routes, scoping entities and
//! audit events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::Link;

/// Application state reported by the API when the app is stopped.
pub const APP_STATE_STOPPED: &str = "STOPPED";
/// Application state reported by the API when the app is started.
pub const APP_STATE_STARTED: &str = "STARTED";

/// Log rate limit value meaning "no limit".
pub const UNLIMITED_LOG_RATE: i64 = -1;

/// Treats an explicit JSON `null` the same as a missing field.
fn null_to_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// The `{ "guid": ... }` payload inside a to-one relationship.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidRef {
    pub guid: String,
}

/// A to-one relationship. `data` is `null` when the relationship is unset
/// (for example a space without a quota).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToOneRelationship {
    #[serde(default)]
    pub data: Option<GuidRef>,
}

impl ToOneRelationship {
    pub fn guid(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.guid.as_str()).filter(|guid| !guid.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct App {
    pub guid: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub state: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub lifecycle: Lifecycle,
    #[serde(default)]
    pub relationships: AppRelationships,
}

impl App {
    pub fn is_stopped(&self) -> bool {
        self.state == APP_STATE_STOPPED
    }

    pub fn is_started(&self) -> bool {
        self.state == APP_STATE_STARTED
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lifecycle {
    #[serde(rename = "type", default)]
    pub lifecycle_type: String,
    #[serde(default)]
    pub data: LifecycleData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleData {
    #[serde(default, deserialize_with = "null_to_default")]
    pub buildpacks: Vec<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub stack: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRelationships {
    #[serde(default)]
    pub space: ToOneRelationship,
}

/// A runnable unit of an application (web, worker, task, ...).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub guid: String,
    #[serde(rename = "type", default)]
    pub process_type: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub command: String,
    #[serde(default)]
    pub instances: i64,
    #[serde(default)]
    pub memory_in_mb: i64,
    #[serde(default)]
    pub disk_in_mb: i64,
    #[serde(default)]
    pub log_rate_limit_in_bytes_per_second: Option<i64>,
    #[serde(default)]
    pub health_check: HealthCheck,
    #[serde(default)]
    pub relationships: ProcessRelationships,
    #[serde(default)]
    pub links: ProcessLinks,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Process {
    pub fn app_guid(&self) -> Option<&str> {
        self.relationships.app.guid()
    }

    /// Log rate limit in bytes per second; `-1` is unlimited and `0` undefined.
    pub fn log_rate_limit(&self) -> i64 {
        self.log_rate_limit_in_bytes_per_second.unwrap_or(0)
    }

    pub fn has_log_rate_limit(&self) -> bool {
        self.log_rate_limit() > 0
    }

    /// Tasks scaled to zero are bookkeeping entries, not running processes.
    pub fn is_idle_task(&self) -> bool {
        self.process_type == "task" && self.instances == 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    #[serde(rename = "type", default)]
    pub check_type: String,
    #[serde(default)]
    pub data: HealthCheckData,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckData {
    #[serde(default)]
    pub timeout: Option<f64>,
    #[serde(default)]
    pub invocation_timeout: Option<f64>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRelationships {
    #[serde(default)]
    pub app: ToOneRelationship,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessLinks {
    #[serde(default)]
    pub stats: Option<Link>,
}

/// Runtime telemetry of one running instance of a process.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessStats {
    #[serde(rename = "type", default, deserialize_with = "null_to_default")]
    pub process_type: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub index: i64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub state: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub host: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub uptime: i64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub mem_quota: i64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub disk_quota: i64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub log_rate_limit: i64,
    #[serde(default, deserialize_with = "null_to_default")]
    pub fds_quota: i64,
    #[serde(default)]
    pub isolation_segment: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub instance_ports: Vec<InstancePort>,
    #[serde(default, deserialize_with = "null_to_default")]
    pub usage: ProcessUsage,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstancePort {
    #[serde(default)]
    pub external: i64,
    #[serde(default)]
    pub internal: i64,
    #[serde(default)]
    pub external_tls_proxy_port: Option<i64>,
    #[serde(default)]
    pub internal_tls_proxy_port: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessUsage {
    #[serde(default)]
    pub time: Option<DateTime<Utc>>,
    /// Fraction of one core, `0.25` is 25%.
    #[serde(default, deserialize_with = "null_to_default")]
    pub cpu: f64,
    /// Bytes.
    #[serde(default, deserialize_with = "null_to_default")]
    pub mem: i64,
    /// Bytes.
    #[serde(default, deserialize_with = "null_to_default")]
    pub disk: i64,
    /// Bytes per second.
    #[serde(default, deserialize_with = "null_to_default")]
    pub log_rate: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    pub guid: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub host: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub path: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub destinations: Vec<RouteDestination>,
    #[serde(default)]
    pub relationships: RouteRelationships,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDestination {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub app: DestinationApp,
    #[serde(default)]
    pub port: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationApp {
    #[serde(default)]
    pub guid: String,
    #[serde(default)]
    pub process: Option<DestinationProcess>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DestinationProcess {
    #[serde(rename = "type", default)]
    pub process_type: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteRelationships {
    #[serde(default)]
    pub domain: ToOneRelationship,
    #[serde(default)]
    pub space: ToOneRelationship,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub guid: String,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Space {
    pub guid: String,
    pub name: String,
    #[serde(default)]
    pub relationships: SpaceRelationships,
}

impl Space {
    pub fn organization_guid(&self) -> Option<&str> {
        self.relationships.organization.guid()
    }

    pub fn quota_guid(&self) -> Option<&str> {
        self.relationships.quota.guid()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceRelationships {
    #[serde(default)]
    pub organization: ToOneRelationship,
    #[serde(default)]
    pub quota: ToOneRelationship,
}

/// Space quota limits. Every limit is `None` when unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceQuota {
    pub guid: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub apps: AppQuotaLimits,
    #[serde(default)]
    pub services: ServiceQuotaLimits,
    #[serde(default)]
    pub routes: RouteQuotaLimits,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppQuotaLimits {
    #[serde(default)]
    pub total_memory_in_mb: Option<i64>,
    #[serde(default)]
    pub per_process_memory_in_mb: Option<i64>,
    #[serde(default)]
    pub total_instances: Option<i64>,
    #[serde(default)]
    pub per_app_tasks: Option<i64>,
    #[serde(default)]
    pub log_rate_limit_in_bytes_per_second: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceQuotaLimits {
    #[serde(default)]
    pub paid_services_allowed: bool,
    #[serde(default)]
    pub total_service_instances: Option<i64>,
    #[serde(default)]
    pub total_service_keys: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuotaLimits {
    #[serde(default)]
    pub total_routes: Option<i64>,
    #[serde(default)]
    pub total_reserved_ports: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInstance {
    pub guid: String,
    #[serde(default)]
    pub name: String,
}

/// A timestamped record of a platform action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub guid: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub actor: EventParty,
    #[serde(default)]
    pub target: EventParty,
    #[serde(default)]
    pub space: Option<GuidRef>,
    #[serde(default)]
    pub organization: Option<GuidRef>,
}

/// Actor or target of an audit event.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParty {
    #[serde(default, deserialize_with = "null_to_default")]
    pub guid: String,
    #[serde(rename = "type", default, deserialize_with = "null_to_default")]
    pub party_type: String,
    #[serde(default, deserialize_with = "null_to_default")]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn process_decodes_typed_health_check_timeouts() {
        let process: Process = serde_json::from_value(json!({
            "guid": "proc-1",
            "type": "web",
            "command": null,
            "instances": 2,
            "memory_in_mb": 256,
            "disk_in_mb": 1024,
            "log_rate_limit_in_bytes_per_second": -1,
            "health_check": {
                "type": "http",
                "data": { "timeout": 60, "invocation_timeout": null, "endpoint": "/health" }
            },
            "relationships": { "app": { "data": { "guid": "app-1" } } },
            "links": { "stats": { "href": "https://api.example.com/v3/processes/proc-1/stats" } }
        }))
        .expect("decode process");

        assert_eq!(process.health_check.data.timeout, Some(60.0));
        assert_eq!(process.health_check.data.invocation_timeout, None);
        assert_eq!(process.app_guid(), Some("app-1"));
        assert_eq!(process.log_rate_limit(), UNLIMITED_LOG_RATE);
        assert!(!process.has_log_rate_limit());
        assert_eq!(process.command, "");
    }

    #[test]
    fn idle_tasks_are_detected() {
        let task = Process {
            process_type: "task".into(),
            instances: 0,
            ..Process::default()
        };
        let worker = Process {
            process_type: "worker".into(),
            instances: 0,
            ..Process::default()
        };
        assert!(task.is_idle_task());
        assert!(!worker.is_idle_task());
    }

    #[test]
    fn stats_for_down_instance_tolerate_nulls() {
        let stats: ProcessStats = serde_json::from_value(json!({
            "type": "web",
            "index": 1,
            "state": "DOWN",
            "host": null,
            "uptime": null,
            "usage": {},
            "instance_ports": null,
            "details": "insufficient resources"
        }))
        .expect("decode stats");

        assert_eq!(stats.state, "DOWN");
        assert_eq!(stats.host, "");
        assert_eq!(stats.uptime, 0);
        assert!(stats.instance_ports.is_empty());
        assert_eq!(stats.usage.mem, 0);
    }

    #[test]
    fn space_without_quota_has_no_quota_guid() {
        let space: Space = serde_json::from_value(json!({
            "guid": "space-1",
            "name": "dev",
            "relationships": {
                "organization": { "data": { "guid": "org-1" } },
                "quota": { "data": null }
            }
        }))
        .expect("decode space");

        assert_eq!(space.organization_guid(), Some("org-1"));
        assert_eq!(space.quota_guid(), None);
    }

    #[test]
    fn audit_event_reads_actor_and_target() {
        let event: AuditEvent = serde_json::from_value(json!({
            "guid": "evt-1",
            "created_at": "2024-03-01T10:00:00Z",
            "type": "audit.app.update",
            "actor": { "guid": "user-1", "type": "user", "name": "admin" },
            "target": { "guid": "app-1", "type": "app", "name": null },
            "space": { "guid": "space-1" },
            "organization": { "guid": "org-1" }
        }))
        .expect("decode event");

        assert_eq!(event.event_type, "audit.app.update");
        assert_eq!(event.actor.name, "admin");
        assert_eq!(event.target.party_type, "app");
        assert_eq!(event.target.name, "");
    }
}
