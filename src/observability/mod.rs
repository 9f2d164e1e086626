//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging via `tracing`; request ids flow through every log
//!   line of a request
//! - Metrics are cheap atomic updates; the Prometheus endpoint is opt-in

pub mod metrics;
