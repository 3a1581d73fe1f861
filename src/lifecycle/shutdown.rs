//! Shutdown coordination for the intake server.

use tokio::sync::broadcast;

/// Fans one stop signal out to the HTTP server and the limiter sweeper.
///
/// Clones share the same channel, so the signal task and `main` can hold
/// their own handle.
#[derive(Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// A receiver that resolves once `trigger` is called.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscriber to stop. Calling it again is a no-op for
    /// receivers that already saw the first signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// How many receivers are still alive.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
