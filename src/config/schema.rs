//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML config
//! files. Every section has defaults so a minimal config only needs its
//! services.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Listen port used when the config specifies none.
pub const DEFAULT_PORT: u16 = 433;

/// Root configuration for the proxy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyConfig {
    /// Ports the proxy listens on. Empty means `[DEFAULT_PORT]`.
    pub ports: Vec<u16>,

    /// Load-balancing strategy: `"rr"` or `"wrr"`, case-insensitive.
    /// Unrecognized names fall back to round robin.
    pub strategy: String,

    /// Cap on concurrent in-flight requests across all listeners.
    pub max_connections: u32,

    /// Service definitions.
    pub services: Vec<ServiceConfig>,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Timeout settings.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            ports: Vec::new(),
            strategy: "rr".to_string(),
            max_connections: 1024,
            services: Vec::new(),
            health_check: HealthCheckConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl ProxyConfig {
    /// The effective listener set: the configured ports, or the default
    /// port when the list is absent or empty.
    pub fn listen_ports(&self) -> Vec<u16> {
        if self.ports.is_empty() {
            vec![DEFAULT_PORT]
        } else {
            self.ports.clone()
        }
    }
}

/// One service: a group of interchangeable replicas behind a matcher.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service identifier for logging and metrics.
    pub name: String,

    /// Request path the service is registered under (exact match).
    pub matcher: String,

    /// Backend replicas of this service.
    pub replicas: Vec<ReplicaConfig>,
}

/// One backend replica.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplicaConfig {
    /// Absolute backend URL (scheme + host + port).
    pub url: String,

    /// Per-replica knobs; `"weight"` is read by the weighted balancer.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Per-probe timeout in seconds; clamped to half the interval.
    pub timeout_secs: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            timeout_secs: 5,
        }
    }
}

/// Timeout configuration for the listeners and the egress client.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Inbound read timeout in seconds.
    pub read_secs: u64,

    /// Outbound write timeout in seconds.
    pub write_secs: u64,

    /// Idle connection timeout in seconds.
    pub idle_secs: u64,

    /// Backend connect timeout in seconds.
    pub connect_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 5,
            write_secs: 5,
            idle_secs: 120,
            connect_secs: 5,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus scrape endpoint.
    pub metrics_enabled: bool,

    /// Scrape endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9100".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn listen_ports_default_when_absent() {
        let config = ProxyConfig::default();
        assert_eq!(config.listen_ports(), vec![DEFAULT_PORT]);
    }

    #[test]
    fn listen_ports_pass_through_when_set() {
        let config = ProxyConfig {
            ports: vec![8080, 8081],
            ..ProxyConfig::default()
        };
        assert_eq!(config.listen_ports(), vec![8080, 8081]);
    }

    #[test]
    fn parses_minimal_config() {
        let config: ProxyConfig = toml::from_str(
            r#"
            max_connections = 100

            [[services]]
            name = "a"
            matcher = "/a"

            [[services.replicas]]
            url = "http://127.0.0.1:9090"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_connections, 100);
        assert_eq!(config.strategy, "rr");
        assert_eq!(config.listen_ports(), vec![DEFAULT_PORT]);
        assert_eq!(config.services.len(), 1);
        assert_eq!(config.services[0].matcher, "/a");
        assert!(config.services[0].replicas[0].metadata.is_empty());
        assert_eq!(config.health_check.interval_secs, 10);
    }

    #[test]
    fn parses_replica_metadata() {
        let config: ProxyConfig = toml::from_str(
            r#"
            strategy = "WRR"

            [[services]]
            name = "a"
            matcher = "/a"

            [[services.replicas]]
            url = "http://127.0.0.1:9090"

            [services.replicas.metadata]
            weight = "2"
            "#,
        )
        .unwrap();

        let replica = &config.services[0].replicas[0];
        assert_eq!(replica.metadata.get("weight").map(String::as_str), Some("2"));
    }
}
