//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Route matched → service's balancer
//!     → next() walks the replica sequence under a short lock:
//!         - round_robin.rs (one cursor step per call)
//!         - weighted.rs (weight-many selections per cursor step)
//!     → dead replicas (liveness flag down) are skipped
//!     → Return live replica or AllReplicasDown
//! ```
//!
//! # Design Decisions
//! - Balancers own their replica sequence; the health checker holds the
//!   same `Arc<Backend>` identities and touches only the liveness flag
//! - Selection state lives behind one balancer-local mutex held only
//!   across the selection or an `add`
//! - Strategy is chosen per config, one strategy for all services

pub mod backend;
pub mod round_robin;
pub mod weighted;

use std::sync::Arc;

use backend::Backend;

pub use round_robin::RoundRobin;
pub use weighted::WeightedRoundRobin;

/// Error returned when no live replica can be selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceError {
    AllReplicasDown,
}

impl std::fmt::Display for BalanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceError::AllReplicasDown => write!(f, "all replicas are down"),
        }
    }
}

impl std::error::Error for BalanceError {}

/// Selects the next replica of one service.
///
/// Implementations serialize `next` internally; a balancer can be shared
/// freely across request tasks.
pub trait Balancer: Send + Sync {
    /// The next live replica, or [`BalanceError::AllReplicasDown`].
    fn next(&self) -> Result<Arc<Backend>, BalanceError>;

    /// Append a replica to the selection sequence.
    fn add(&self, backend: Arc<Backend>);

    /// Number of replicas in the sequence.
    fn replica_count(&self) -> usize;
}

/// Load-balancing strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    RoundRobin,
    WeightedRoundRobin,
}

impl Strategy {
    /// Parse a strategy name, case-insensitive. Unrecognized names fall
    /// back to round robin.
    pub fn parse(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "rr" => Strategy::RoundRobin,
            "wrr" => Strategy::WeightedRoundRobin,
            _ => Strategy::RoundRobin,
        }
    }

    /// Build a balancer of this strategy over the given replicas.
    pub fn build(self, backends: Vec<Arc<Backend>>) -> Box<dyn Balancer> {
        match self {
            Strategy::RoundRobin => Box::new(RoundRobin::new(backends)),
            Strategy::WeightedRoundRobin => Box::new(WeightedRoundRobin::new(backends)),
        }
    }
}
