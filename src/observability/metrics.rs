//! Metrics collection and exposition.

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Initialize the Prometheus recorder and scrape endpoint.
pub fn init_metrics(addr: SocketAddr) {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus recorder");

    tracing::info!(address = %addr, "metrics endpoint started");
}

/// Record one proxied request.
pub fn record_request(service: &str, status: u16, elapsed: Duration) {
    let labels = [
        ("service", service.to_string()),
        ("status", status.to_string()),
    ];

    counter!("steer_requests_total", &labels).increment(1);
    histogram!("steer_request_duration_seconds", &labels).record(elapsed.as_secs_f64());
}

/// Export a replica's liveness as a gauge.
pub fn record_replica_alive(service: &str, backend: &str, alive: bool) {
    let value = if alive { 1.0 } else { 0.0 };
    gauge!(
        "steer_replica_alive",
        "service" => service.to_string(),
        "backend" => backend.to_string()
    )
    .set(value);
}
