//! HTTP listeners and request dispatch.
//!
//! # Responsibilities
//! - Run one Axum server per configured port
//! - Dispatch each request: admission, table snapshot, route lookup,
//!   replica selection, forwarding
//! - Drain in-flight requests on shutdown within a bounded grace period

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use axum::body::Body;
use axum::extract::{ConnectInfo, State};
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::balance::BalanceError;
use crate::config::TimeoutConfig;
use crate::http::admission::ConnectionGate;
use crate::http::forward::{self, HttpClient};
use crate::http::request::{self, RequestIdLayer};
use crate::lifecycle::Shutdown;
use crate::observability::metrics;
use crate::routing::RouteTable;

/// State shared by every listener and request task.
#[derive(Clone)]
pub struct AppState {
    /// The active route table; dispatch takes one snapshot per request.
    pub table: Arc<ArcSwap<RouteTable>>,
    pub gate: Arc<ConnectionGate>,
    pub client: HttpClient,
}

/// One listening port of the proxy.
pub struct HttpServer {
    port: u16,
    state: AppState,
    timeouts: TimeoutConfig,
}

impl HttpServer {
    pub fn new(port: u16, state: AppState, timeouts: TimeoutConfig) -> Self {
        Self {
            port,
            state,
            timeouts,
        }
    }

    /// Build the Axum router with all middleware layers.
    fn build_router(&self) -> Router {
        let request_budget =
            Duration::from_secs(self.timeouts.read_secs + self.timeouts.write_secs);
        Router::new()
            .fallback(dispatch)
            .with_state(self.state.clone())
            .layer(TimeoutLayer::new(request_budget))
            .layer(RequestIdLayer)
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until the shutdown signal fires, then drain in-flight
    /// requests. The drain is bounded by the coordinator's grace period;
    /// a listener acknowledges exactly once, drained or not.
    pub async fn run(self, shutdown: &Shutdown) -> Result<(), std::io::Error> {
        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = match TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                shutdown.acknowledge();
                return Err(err);
            }
        };
        tracing::info!(port = self.port, "listener started");

        let app = self
            .build_router()
            .into_make_service_with_connect_info::<SocketAddr>();

        let mut drain_signal = shutdown.subscribe();
        let serve = async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = drain_signal.recv().await;
                })
                .await
        };

        let mut grace_signal = shutdown.subscribe();
        let grace = shutdown.grace_period();
        let port = self.port;
        let result = tokio::select! {
            res = serve => res,
            _ = async {
                let _ = grace_signal.recv().await;
                tokio::time::sleep(grace).await;
            } => {
                tracing::warn!(port, "drain grace period expired, closing listener");
                Ok(())
            }
        };

        tracing::info!(port, "listener stopped");
        shutdown.acknowledge();
        result
    }
}

/// Request entry point: admission, snapshot, route, select, forward.
async fn dispatch(
    State(state): State<AppState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    req: Request<Body>,
) -> Response {
    let started = Instant::now();

    let Some(_admitted) = state.gate.try_acquire() else {
        tracing::warn!(
            remote = %remote,
            in_flight = state.gate.in_flight(),
            "connection limit reached, rejecting request"
        );
        return StatusCode::SERVICE_UNAVAILABLE.into_response();
    };

    let request_id = request::request_id(&req).to_string();
    let path = req.uri().path().to_string();
    tracing::debug!(request_id = %request_id, remote = %remote, path = %path, "request received");

    // one snapshot per request: a concurrent reload swaps the active table
    // without invalidating this one
    let table = state.table.load_full();

    let Some(route) = table.lookup(&path) else {
        tracing::error!(request_id = %request_id, path = %path, "no service registered for path");
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let backend = match route.balancer().next() {
        Ok(backend) => backend,
        Err(BalanceError::AllReplicasDown) => {
            tracing::error!(
                request_id = %request_id,
                service = %route.service(),
                "all replicas are down"
            );
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::debug!(request_id = %request_id, backend = %backend.url(), "forwarding request");
    match forward::forward(&state.client, &backend, req).await {
        Ok(response) => {
            metrics::record_request(route.service(), response.status().as_u16(), started.elapsed());
            response
        }
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                service = %route.service(),
                backend = %backend.url(),
                error = %err,
                "backend proxy failure"
            );
            metrics::record_request(
                route.service(),
                StatusCode::BAD_GATEWAY.as_u16(),
                started.elapsed(),
            );
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}
