//! Proxy lifecycle orchestration.
//!
//! # Responsibilities
//! - Startup: build the initial route table, start health checkers, the
//!   config watcher, and one listener per port
//! - Hot reload: rebuild the table from the changed file and swap it in
//!   while traffic flows
//! - Shutdown: stop checkers, drain listeners, collect acknowledgements

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use tokio::net::TcpStream;
use tokio::task::JoinSet;

use crate::config::{
    load_config, ConfigError, ConfigWatcher, ObservabilityConfig, TimeoutConfig, WatchEvent,
};
use crate::http::admission::ConnectionGate;
use crate::http::forward::{self, HttpClient};
use crate::http::server::{AppState, HttpServer};
use crate::lifecycle::Shutdown;
use crate::routing::RouteTable;

/// File events this close to the previous reload start are dropped.
const RELOAD_DEBOUNCE: Duration = Duration::from_millis(100);
/// Drain window granted to listeners on shutdown.
const DRAIN_GRACE: Duration = Duration::from_secs(10);

/// The proxy process: owns the active route table, the admission gate, and
/// the listener set, and runs the reload pipeline.
///
/// Listen ports are fixed when the proxy is built; a reload that changes
/// `ports` logs the difference and keeps the original set until restart.
#[derive(Clone)]
pub struct Proxy {
    config_path: PathBuf,
    ports: Vec<u16>,
    timeouts: TimeoutConfig,
    observability: ObservabilityConfig,
    table: Arc<ArcSwap<RouteTable>>,
    gate: Arc<ConnectionGate>,
    client: HttpClient,
    shutdown: Arc<Shutdown>,
}

impl Proxy {
    /// Load the config at `path` and build the initial route table.
    /// Config errors here are fatal, unlike on reload.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let config_path = path.as_ref().to_path_buf();
        let config = load_config(&config_path)?;

        let ports = config.listen_ports();
        let table = RouteTable::from_config(&config);
        let gate = Arc::new(ConnectionGate::new(config.max_connections));
        let client = forward::build_client(Duration::from_secs(config.timeouts.connect_secs));

        tracing::info!(
            config = %config_path.display(),
            services = table.len(),
            strategy = %config.strategy,
            max_connections = config.max_connections,
            ports = ?ports,
            "configuration loaded"
        );

        Ok(Self {
            config_path,
            ports,
            timeouts: config.timeouts.clone(),
            observability: config.observability.clone(),
            table: Arc::new(ArcSwap::from_pointee(table)),
            gate,
            client,
            shutdown: Arc::new(Shutdown::new(DRAIN_GRACE)),
        })
    }

    /// Start health checkers, the config watcher, and one listener per
    /// port, then serve until every listener exits.
    pub async fn start(&self) -> Result<(), std::io::Error> {
        self.table.load().start_health_checkers();

        let watcher = self.clone();
        tokio::spawn(async move { watcher.watch_config().await });

        let state = AppState {
            table: self.table.clone(),
            gate: self.gate.clone(),
            client: self.client.clone(),
        };

        let mut listeners = JoinSet::new();
        for port in self.ports.clone() {
            let server = HttpServer::new(port, state.clone(), self.timeouts.clone());
            let shutdown = self.shutdown.clone();
            listeners.spawn(async move { server.run(&shutdown).await });
        }

        let mut first_error = None;
        while let Some(joined) = listeners.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(error = %err, "listener failed");
                    first_error.get_or_insert(err);
                }
                Err(err) => {
                    tracing::error!(error = %err, "listener task panicked");
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Config watcher loop: debounce event bursts, run the reload
    /// pipeline, stop on config removal or process shutdown.
    async fn watch_config(&self) {
        let mut watcher = match ConfigWatcher::new(&self.config_path) {
            Ok(watcher) => watcher,
            Err(err) => {
                tracing::error!(error = %err, "config watcher failed to start, hot reload disabled");
                return;
            }
        };
        tracing::info!(config = %self.config_path.display(), "config watcher started");

        let mut stop = self.shutdown.subscribe();
        let mut last_reload: Option<Instant> = None;
        loop {
            tokio::select! {
                event = watcher.changed() => match event {
                    Some(WatchEvent::Modified) => {
                        if last_reload.is_some_and(|at| at.elapsed() < RELOAD_DEBOUNCE) {
                            continue;
                        }
                        last_reload = Some(Instant::now());
                        tracing::info!("config file modified, reloading");
                        self.reload().await;
                    }
                    Some(WatchEvent::Removed) => {
                        tracing::error!("config file removed, hot reload disabled until restart");
                        break;
                    }
                    None => {
                        tracing::error!("config watch channel closed");
                        break;
                    }
                },
                _ = stop.recv() => break,
            }
        }
    }

    /// Reload pipeline: parse, build the new table, stop the old health
    /// checkers, swap atomically, start the new checkers. A config that
    /// fails to load leaves the active table untouched.
    async fn reload(&self) {
        let config = match load_config(&self.config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(error = %err, "config reload failed, keeping active table");
                return;
            }
        };

        if config.listen_ports() != self.ports {
            tracing::warn!(
                active = ?self.ports,
                configured = ?config.listen_ports(),
                "listen ports changed; port changes take effect on restart"
            );
        }

        let fresh = Arc::new(RouteTable::from_config(&config));

        let previous = self.table.load_full();
        previous.stop_health_checkers().await;

        self.table.store(fresh.clone());
        fresh.start_health_checkers();
        self.gate.set_max_connections(config.max_connections);

        tracing::info!(
            services = fresh.len(),
            max_connections = config.max_connections,
            "configuration reloaded"
        );
    }

    /// True when every listen port accepts a TCP connection.
    pub async fn is_ready(&self) -> bool {
        for port in &self.ports {
            if TcpStream::connect(("127.0.0.1", *port)).await.is_err() {
                return false;
            }
        }
        true
    }

    /// Stop health checkers, drain listeners within the grace period, and
    /// collect each listener's acknowledgement. Returns `true` once every
    /// listener has acknowledged.
    pub async fn shut_down(&self) -> bool {
        let table = self.table.load_full();
        table.stop_health_checkers().await;

        self.shutdown.trigger();
        let deadline = self.shutdown.grace_period() + Duration::from_secs(1);
        let acknowledged = tokio::time::timeout(
            deadline,
            self.shutdown.await_acknowledgements(self.ports.len()),
        )
        .await;

        if acknowledged.is_err() {
            tracing::error!("timed out waiting for listener acknowledgements");
            return false;
        }
        tracing::info!("all listeners stopped");
        true
    }

    /// The fixed listener set.
    pub fn ports(&self) -> &[u16] {
        &self.ports
    }

    pub fn observability(&self) -> &ObservabilityConfig {
        &self.observability
    }
}
