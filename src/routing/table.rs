//! Route table construction and lookup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::balance::backend::Backend;
use crate::balance::{Balancer, Strategy};
use crate::config::ProxyConfig;
use crate::health::HealthChecker;

/// One service's dispatch state.
///
/// The balancer and the health checker hold the same replica identities;
/// the table owns both and keeps their lifetimes aligned.
pub struct ServiceRoute {
    service: String,
    balancer: Box<dyn Balancer>,
    checker: HealthChecker,
}

impl ServiceRoute {
    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn balancer(&self) -> &dyn Balancer {
        self.balancer.as_ref()
    }

    pub fn checker(&self) -> &HealthChecker {
        &self.checker
    }
}

/// Immutable mapping from request path to service dispatch state.
///
/// A reload builds a whole new table and swaps it in; snapshots taken
/// before the swap keep serving from the table they loaded.
pub struct RouteTable {
    routes: HashMap<String, ServiceRoute>,
}

impl RouteTable {
    /// Build a fresh table from a parsed config.
    pub fn from_config(config: &ProxyConfig) -> Self {
        let strategy = Strategy::parse(&config.strategy);
        let mut routes = HashMap::new();

        for service in &config.services {
            let mut backends = Vec::with_capacity(service.replicas.len());
            for replica in &service.replicas {
                match Backend::new(replica, &service.name) {
                    Ok(backend) => backends.push(Arc::new(backend)),
                    Err(err) => {
                        tracing::warn!(
                            service = %service.name,
                            url = %replica.url,
                            error = %err,
                            "skipping replica with invalid url"
                        );
                    }
                }
            }

            let checker = HealthChecker::new(&service.name, backends.clone(), &config.health_check);
            let balancer = strategy.build(backends);
            routes.insert(
                service.matcher.clone(),
                ServiceRoute {
                    service: service.name.clone(),
                    balancer,
                    checker,
                },
            );
        }

        Self { routes }
    }

    /// Exact-path lookup.
    pub fn lookup(&self, path: &str) -> Option<&ServiceRoute> {
        self.routes.get(path)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Start every service's health checker.
    pub fn start_health_checkers(&self) {
        for route in self.routes.values() {
            route.checker.start();
        }
    }

    /// Stop every service's health checker and wait for them.
    pub async fn stop_health_checkers(&self) {
        for route in self.routes.values() {
            route.checker.shut_down().await;
        }
    }
}
