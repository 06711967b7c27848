//! Shutdown coordination for the health monitor.
//!
//! `LoadBalancer::start` creates one coordinator per monitor run and hands
//! the monitor a receiver. The monitor checks it between ticks and while
//! probing, and treats it as cancellation while a permit revocation waits.

use tokio::sync::broadcast;

/// Stop signal for a monitor run.
///
/// The channel holds one message, so a signal sent before the monitor next
/// polls its receiver is still seen.
#[derive(Debug)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Fire the signal. Subscribers that already exited are ignored.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of subscribers still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
