//! Shutdown coordination.

use tokio::sync::watch;

/// One-shot latch that any number of tasks can wait on.
///
/// Unlike a broadcast channel, a subscriber created after [`Shutdown::trigger`]
/// still observes the trigger.
#[derive(Debug)]
pub struct Shutdown {
    tx: watch::Sender<bool>,
}

impl Shutdown {
    /// Create a new, untriggered latch.
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
        }
    }

    /// Trigger the shutdown signal. Idempotent.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_triggered(&self) -> bool {
        *self.tx.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Receiving half of a [`Shutdown`] latch.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Resolve once the latch is triggered.
    pub async fn recv(mut self) {
        // Err means the sender is gone, which can only happen once the owner
        // is dropped; treat that as triggered.
        let _ = self.rx.wait_for(|triggered| *triggered).await;
    }
}
