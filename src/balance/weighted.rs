//! Weighted round-robin selection.

use std::sync::{Arc, Mutex};

use crate::balance::backend::Backend;
use crate::balance::{BalanceError, Balancer};

/// Weighted variant of round robin.
///
/// Each replica carries a weight (`metadata["weight"]`, default 1) and
/// receives that many consecutive selections before the cursor advances.
/// With uniform weights this behaves exactly like [`super::RoundRobin`].
#[derive(Debug)]
pub struct WeightedRoundRobin {
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    backends: Vec<Arc<Backend>>,
    cursor: usize,
    /// Selections granted to the replica under the cursor so far; rolls
    /// over to 1 when it reaches the replica's weight.
    credit: u32,
}

impl WeightedRoundRobin {
    pub fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            state: Mutex::new(State {
                backends,
                cursor: 0,
                credit: 0,
            }),
        }
    }
}

impl Balancer for WeightedRoundRobin {
    fn next(&self) -> Result<Arc<Backend>, BalanceError> {
        let mut state = self.state.lock().expect("balancer lock poisoned");
        let count = state.backends.len();
        if count == 0 {
            return Err(BalanceError::AllReplicasDown);
        }

        if state.credit < state.backends[state.cursor].weight() {
            state.credit += 1;
        } else {
            state.credit = 1;
            state.cursor = (state.cursor + 1) % count;
        }
        if state.backends[state.cursor].is_alive() {
            return Ok(state.backends[state.cursor].clone());
        }

        // dead candidate: advance like plain round robin, at most one
        // full rotation
        for _ in 1..count {
            state.credit = 1;
            state.cursor = (state.cursor + 1) % count;
            if state.backends[state.cursor].is_alive() {
                return Ok(state.backends[state.cursor].clone());
            }
        }
        Err(BalanceError::AllReplicasDown)
    }

    fn add(&self, backend: Arc<Backend>) {
        self.state
            .lock()
            .expect("balancer lock poisoned")
            .backends
            .push(backend);
    }

    fn replica_count(&self) -> usize {
        self.state.lock().expect("balancer lock poisoned").backends.len()
    }
}
