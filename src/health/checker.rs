//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every replica of one service
//! - Flip per-replica liveness on probe outcome
//! - Stop cleanly when the owning route table is replaced
//!
//! # Design Decisions
//! - Probes are TCP dials with a per-probe timeout of at most half the
//!   interval, so a probe round always fits inside one interval
//! - Probes for distinct replicas run in parallel
//! - Probe failures only flip liveness; the checker itself never fails

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};

use crate::balance::backend::Backend;
use crate::config::HealthCheckConfig;
use crate::observability::metrics;

/// Periodic liveness prober for the replicas of one service.
///
/// Shares replica identities with the service's balancer; both sides touch
/// only the atomic liveness flag. Runs `stopped → running → stopping →
/// stopped`; a checker that has been stopped is not restartable — a reload
/// constructs a fresh one.
pub struct HealthChecker {
    service: String,
    backends: Vec<Arc<Backend>>,
    interval: Duration,
    probe_timeout: Duration,
    stop: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl HealthChecker {
    pub fn new(service: &str, backends: Vec<Arc<Backend>>, config: &HealthCheckConfig) -> Self {
        let interval = Duration::from_secs(config.interval_secs.max(1));
        let probe_timeout = Duration::from_secs(config.timeout_secs.max(1)).min(interval / 2);
        let (stop, _) = watch::channel(false);

        Self {
            service: service.to_string(),
            backends,
            interval,
            probe_timeout,
            stop,
            task: Mutex::new(None),
        }
    }

    /// Spawn the probe loop. The first round runs immediately. A checker
    /// that has already been shut down refuses to start again.
    pub fn start(&self) {
        if *self.stop.borrow() {
            tracing::warn!(service = %self.service, "health checker already stopped, not restarting");
            return;
        }
        let mut task = self.task.lock().expect("health task lock poisoned");
        if task.is_some() {
            return;
        }

        let service = self.service.clone();
        let backends = self.backends.clone();
        let interval = self.interval;
        let probe_timeout = self.probe_timeout;
        let mut stop_rx = self.stop.subscribe();

        *task = Some(tokio::spawn(async move {
            tracing::info!(
                service = %service,
                replicas = backends.len(),
                interval_secs = interval.as_secs(),
                "health checker started"
            );
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => probe_round(&service, &backends, probe_timeout).await,
                    _ = stop_rx.changed() => break,
                }
            }
            tracing::info!(service = %service, "health checker stopped");
        }));
    }

    /// Signal the loop to stop and wait for the in-flight probe round.
    pub async fn shut_down(&self) {
        self.stop.send_replace(true);
        let task = self.task.lock().expect("health task lock poisoned").take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }
}

/// Probe every replica once, in parallel, and update liveness flags.
async fn probe_round(service: &str, backends: &[Arc<Backend>], probe_timeout: Duration) {
    let mut probes = JoinSet::new();
    for backend in backends {
        let backend = backend.clone();
        let service = service.to_string();
        probes.spawn(async move {
            let alive = probe(&backend, probe_timeout).await;
            let was_alive = backend.set_alive(alive);
            if was_alive != alive {
                if alive {
                    tracing::info!(service = %service, backend = %backend.url(), "replica back up");
                } else {
                    tracing::warn!(service = %service, backend = %backend.url(), "replica down");
                }
            }
            metrics::record_replica_alive(&service, &backend.url().to_string(), alive);
        });
    }
    while probes.join_next().await.is_some() {}
}

/// One TCP dial bounded by the probe timeout.
async fn probe(backend: &Backend, probe_timeout: Duration) -> bool {
    matches!(
        tokio::time::timeout(probe_timeout, TcpStream::connect(backend.probe_addr())).await,
        Ok(Ok(_))
    )
}
