use super::recover;
use crate::camera::Frame;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Condvar, Mutex, PoisonError,
};
use std::time::{Duration, Instant};

/// Overwrite buffer with capacity one.
///
/// Gesture extraction runs slower than capture, so anything older than the
/// newest frame only adds latency. Publishing replaces an unconsumed frame and
/// taking removes it, so a frame is handed out at most once.
#[derive(Debug, Default)]
pub struct FrameBuffer {
    slot: Mutex<Option<Frame>>,
    available: Condvar,
    evicted: AtomicU64,
}

impl FrameBuffer {
    /// Create an empty buffer
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `frame`, evicting the unconsumed one if present.
    ///
    /// Never blocks. Returns `true` when a stale frame was evicted.
    pub fn publish(&self, frame: Frame) -> bool {
        let evicted = {
            let mut slot = recover(self.slot.lock());
            slot.replace(frame).is_some()
        };
        if evicted {
            self.evicted.fetch_add(1, Ordering::Relaxed);
        }
        self.available.notify_one();
        evicted
    }

    /// Block until a frame is available, then remove and return it
    pub fn take(&self) -> Frame {
        let mut slot = recover(self.slot.lock());
        loop {
            if let Some(frame) = slot.take() {
                return frame;
            }
            slot = self
                .available
                .wait(slot)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like [`take`](Self::take) but gives up after `timeout`
    pub fn take_timeout(&self, timeout: Duration) -> Option<Frame> {
        let deadline = Instant::now() + timeout;
        let mut slot = recover(self.slot.lock());
        loop {
            if let Some(frame) = slot.take() {
                return Some(frame);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let (guard, _) = self
                .available
                .wait_timeout(slot, deadline - now)
                .unwrap_or_else(PoisonError::into_inner);
            slot = guard;
        }
    }

    /// Remove the frame if one is present, without waiting
    pub fn try_take(&self) -> Option<Frame> {
        recover(self.slot.lock()).take()
    }

    /// Whether the slot is currently empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        recover(self.slot.lock()).is_none()
    }

    /// Number of frames evicted before anyone took them
    #[must_use]
    pub fn evicted_count(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }
}
