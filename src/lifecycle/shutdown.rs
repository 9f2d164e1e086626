//! Shutdown coordination for the proxy.

use std::time::Duration;

use tokio::sync::{broadcast, mpsc, Mutex};

/// Coordinator for graceful shutdown.
///
/// The stop signal fans out over a broadcast channel. Each listener sends
/// one acknowledgement once its drain completes (or its grace period
/// expires); `await_acknowledgements` collects them.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    ack_tx: mpsc::UnboundedSender<()>,
    ack_rx: Mutex<mpsc::UnboundedReceiver<()>>,
    grace_period: Duration,
}

impl Shutdown {
    pub fn new(grace_period: Duration) -> Self {
        let (tx, _) = broadcast::channel(1);
        let (ack_tx, ack_rx) = mpsc::unbounded_channel();
        Self {
            tx,
            ack_tx,
            ack_rx: Mutex::new(ack_rx),
            grace_period,
        }
    }

    /// Subscribe to the stop signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the stop signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Report one listener as stopped.
    pub fn acknowledge(&self) {
        let _ = self.ack_tx.send(());
    }

    /// Wait until `count` listeners have acknowledged.
    pub async fn await_acknowledgements(&self, count: usize) {
        let mut ack_rx = self.ack_rx.lock().await;
        for _ in 0..count {
            if ack_rx.recv().await.is_none() {
                break;
            }
        }
    }

    /// Drain window granted to each listener after `trigger`.
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }
}
