//! Admission control for in-flight requests.
//!
//! # Responsibilities
//! - Cap concurrent in-flight requests across all listeners
//! - Count admissions up and completions down, exactly once each

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Process-wide cap on concurrent in-flight requests.
///
/// The counter is incremented on admit and decremented exactly once when
/// the returned guard drops. The decrement is compare-then-subtract so the
/// counter cannot underflow. The cap itself is refreshed on config reload.
#[derive(Debug)]
pub struct ConnectionGate {
    connections: AtomicU32,
    max_connections: AtomicU32,
}

impl ConnectionGate {
    pub fn new(max_connections: u32) -> Self {
        Self {
            connections: AtomicU32::new(0),
            max_connections: AtomicU32::new(max_connections),
        }
    }

    /// Admit one request, or `None` when the cap is reached.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ConnectionGuard> {
        if self.connections.load(Ordering::Acquire) >= self.max_connections.load(Ordering::Acquire)
        {
            return None;
        }
        self.connections.fetch_add(1, Ordering::AcqRel);
        Some(ConnectionGuard { gate: self.clone() })
    }

    /// Current number of admitted requests.
    pub fn in_flight(&self) -> u32 {
        self.connections.load(Ordering::Acquire)
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.load(Ordering::Acquire)
    }

    /// Replace the cap; called by the reload pipeline.
    pub fn set_max_connections(&self, max_connections: u32) {
        self.max_connections.store(max_connections, Ordering::Release);
    }

    fn release(&self) {
        let mut current = self.connections.load(Ordering::Acquire);
        while current > 0 {
            match self.connections.compare_exchange_weak(
                current,
                current - 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return,
                Err(observed) => current = observed,
            }
        }
    }
}

/// Releases one admission slot on drop.
#[derive(Debug)]
pub struct ConnectionGuard {
    gate: Arc<ConnectionGate>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.gate.release();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_the_cap() {
        let gate = Arc::new(ConnectionGate::new(2));

        let first = gate.try_acquire().unwrap();
        let _second = gate.try_acquire().unwrap();
        assert!(gate.try_acquire().is_none());
        assert_eq!(gate.in_flight(), 2);

        drop(first);
        assert_eq!(gate.in_flight(), 1);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn release_does_not_underflow() {
        let gate = Arc::new(ConnectionGate::new(1));
        assert_eq!(gate.in_flight(), 0);
        gate.release();
        assert_eq!(gate.in_flight(), 0);
    }

    #[test]
    fn cap_can_be_raised_at_runtime() {
        let gate = Arc::new(ConnectionGate::new(1));
        let _held = gate.try_acquire().unwrap();
        assert!(gate.try_acquire().is_none());

        gate.set_max_connections(2);
        assert_eq!(gate.max_connections(), 2);
        assert!(gate.try_acquire().is_some());
    }

    #[test]
    fn counter_returns_to_zero() {
        let gate = Arc::new(ConnectionGate::new(16));
        let guards: Vec<_> = (0..10).filter_map(|_| gate.try_acquire()).collect();
        assert_eq!(gate.in_flight(), 10);
        drop(guards);
        assert_eq!(gate.in_flight(), 0);
    }
}
