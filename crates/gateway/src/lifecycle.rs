//! Readiness gate shared between the consumer loop and the health server.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

/// Observable readiness flag.
///
/// Starts not-ready, flips to ready immediately before the consumer enters
/// its polling loop, and back to not-ready when shutdown begins. The health
/// endpoints read it; the consumer task and the shutdown path write it.
#[derive(Clone, Default)]
pub struct ReadinessGate {
    ready: Arc<AtomicBool>,
}

impl ReadinessGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the gateway as ready to receive traffic.
    pub fn mark_ready(&self) {
        self.ready.store(true, Ordering::SeqCst);
        info!("gateway marked as ready");
    }

    /// Mark the gateway as not ready (e.g. during shutdown). Idempotent.
    pub fn mark_not_ready(&self) {
        self.ready.store(false, Ordering::SeqCst);
    }

    pub fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }
}
