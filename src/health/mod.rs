//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Per-service checker loop (checker.rs):
//!     Interval timer
//!     → TCP dial each replica in parallel, bounded by a probe timeout
//!     → success: alive = true, failure: alive = false
//!     → balancers skip replicas whose flag is down
//! ```
//!
//! # Design Decisions
//! - One checker per service, owned by the route table alongside the
//!   service's balancer
//! - Liveness is a per-replica atomic flag, not a counter state machine

pub mod checker;

pub use checker::HealthChecker;
