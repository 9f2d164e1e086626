//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route table build (at startup and on reload):
//!     ProxyConfig
//!     → Backends per replica (shared with the service's health checker)
//!     → strategy balancer per service
//!     → Freeze as an immutable RouteTable
//!
//! Per request:
//!     dispatcher snapshots the active table
//!     → exact-path lookup
//!     → service's balancer
//! ```
//!
//! # Design Decisions
//! - Tables are immutable after construction; a reload swaps in a new one
//! - Matching is exact path equality, no prefixes, no regex
//! - Deterministic: same path always reaches the same service

pub mod table;

pub use table::{RouteTable, ServiceRoute};
