//! Lifecycle management state and behavior.
//!
//! Isolates process-wide lifecycle signals from the rest of the [`Hub`](super::Hub).

use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

/// Lifecycle management state.
///
/// Every connection task and the gateway accept loop subscribe to the
/// shutdown signal; a single [`shutdown`](Self::shutdown) winds them all down
/// through their normal cleanup paths. The signal is not replayed, so a
/// task that subscribes late checks [`is_shutting_down`](Self::is_shutting_down)
/// right after subscribing.
#[derive(Debug)]
pub struct LifecycleManager {
    /// Shutdown signal broadcaster.
    shutdown_tx: broadcast::Sender<()>,
    /// Set before the signal is sent and never cleared.
    shutting_down: AtomicBool,
}

impl LifecycleManager {
    pub fn new() -> Self {
        // Capacity 16 provides buffer for multiple slow subscribers during shutdown
        let (shutdown_tx, _) = broadcast::channel(16);
        Self {
            shutdown_tx,
            shutting_down: AtomicBool::new(false),
        }
    }

    /// Receive the shutdown signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Signal every subscriber to stop. Returns how many were listening.
    pub fn shutdown(&self) -> usize {
        self.shutting_down.store(true, Ordering::SeqCst);
        self.shutdown_tx.send(()).unwrap_or(0)
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_shutting_down(&self) -> bool {
        self.shutting_down.load(Ordering::SeqCst)
    }
}

impl Default for LifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}
