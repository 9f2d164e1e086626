//! Round-robin selection.

use std::sync::{Arc, Mutex};

use crate::balance::backend::Backend;
use crate::balance::{BalanceError, Balancer};

/// Rotates through replicas one position per call, skipping replicas whose
/// liveness flag is down. Dead replicas still consume cursor positions, so
/// rotation stays fair while replicas flap.
#[derive(Debug)]
pub struct RoundRobin {
    state: Mutex<State>,
}

#[derive(Debug)]
struct State {
    backends: Vec<Arc<Backend>>,
    cursor: usize,
}

impl RoundRobin {
    pub fn new(backends: Vec<Arc<Backend>>) -> Self {
        Self {
            state: Mutex::new(State {
                backends,
                cursor: 0,
            }),
        }
    }
}

impl Balancer for RoundRobin {
    fn next(&self) -> Result<Arc<Backend>, BalanceError> {
        let mut state = self.state.lock().expect("balancer lock poisoned");
        let count = state.backends.len();
        for _ in 0..count {
            let candidate = state.backends[state.cursor].clone();
            state.cursor = (state.cursor + 1) % count;
            if candidate.is_alive() {
                return Ok(candidate);
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ReplicaConfig;
    use std::collections::HashMap;

    fn backend(url: &str) -> Arc<Backend> {
        Arc::new(
            Backend::new(
                &ReplicaConfig {
                    url: url.to_string(),
                    metadata: HashMap::new(),
                },
                "svc",
            )
            .unwrap(),
        )
    }

    fn urls(rr: &RoundRobin, calls: usize) -> Vec<String> {
        (0..calls)
            .map(|_| rr.next().unwrap().url().to_string())
            .collect()
    }

    #[test]
    fn alternates_starting_at_first_replica() {
        let rr = RoundRobin::new(vec![backend("http://h:1/"), backend("http://h:2/")]);
        assert_eq!(
            urls(&rr, 6),
            vec![
                "http://h:1/",
                "http://h:2/",
                "http://h:1/",
                "http://h:2/",
                "http://h:1/",
                "http://h:2/",
            ]
        );
    }

    #[test]
    fn fairness_over_three_replicas() {
        let rr = RoundRobin::new(vec![
            backend("http://h:1/"),
            backend("http://h:2/"),
            backend("http://h:3/"),
        ]);
        let picks = urls(&rr, 9);
        for url in ["http://h:1/", "http://h:2/", "http://h:3/"] {
            assert_eq!(picks.iter().filter(|u| u.as_str() == url).count(), 3);
        }
    }

    #[test]
    fn skips_dead_replicas() {
        let dead = backend("http://h:2/");
        dead.set_alive(false);
        let rr = RoundRobin::new(vec![backend("http://h:1/"), dead.clone(), backend("http://h:3/")]);

        assert_eq!(
            urls(&rr, 4),
            vec!["http://h:1/", "http://h:3/", "http://h:1/", "http://h:3/"]
        );

        // a revived replica rejoins the rotation where the cursor left off
        dead.set_alive(true);
        assert_eq!(urls(&rr, 3), vec!["http://h:1/", "http://h:2/", "http://h:3/"]);
    }

    #[test]
    fn errors_when_all_replicas_down() {
        let a = backend("http://h:1/");
        let b = backend("http://h:2/");
        a.set_alive(false);
        b.set_alive(false);
        let rr = RoundRobin::new(vec![a, b]);

        assert_eq!(rr.next().unwrap_err(), BalanceError::AllReplicasDown);
    }

    #[test]
    fn errors_when_empty() {
        let rr = RoundRobin::new(Vec::new());
        assert_eq!(rr.next().unwrap_err(), BalanceError::AllReplicasDown);
    }

    #[test]
    fn add_is_safe_against_concurrent_next() {
        let rr = Arc::new(RoundRobin::new(vec![backend("http://h:1/")]));

        let selector = {
            let rr = rr.clone();
            std::thread::spawn(move || {
                for _ in 0..10_000 {
                    rr.next().unwrap();
                }
            })
        };
        let adder = {
            let rr = rr.clone();
            std::thread::spawn(move || {
                for i in 0..100 {
                    rr.add(backend(&format!("http://h:{}/", 100 + i)));
                }
            })
        };

        selector.join().unwrap();
        adder.join().unwrap();
        assert_eq!(rr.replica_count(), 101);
    }
}
