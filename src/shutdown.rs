//! Cooperative stop flags shared between the main thread and workers.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Cloneable flag a worker loop polls to know when to exit
#[derive(Debug, Clone, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    /// Create a flag in the running state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this flag to stop
    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether a stop has been requested
    #[must_use]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Sleep for `interval` unless a stop is requested first.
    ///
    /// Returns `true` when the caller should exit.
    pub fn sleep(&self, interval: Duration) -> bool {
        if self.is_requested() {
            return true;
        }
        std::thread::sleep(interval);
        self.is_requested()
    }
}
