//! Lock-free pipeline counters.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the worker threads
#[derive(Debug, Default)]
pub struct PipelineStats {
    frames_captured: AtomicU64,
    frames_dropped: AtomicU64,
    frames_processed: AtomicU64,
    audio_buffers: AtomicU64,
    audio_dropped: AtomicU64,
    clap_events: AtomicU64,
    commands_enqueued: AtomicU64,
    commands_dispatched: AtomicU64,
    actuator_failures: AtomicU64,
}

/// Point-in-time copy of [`PipelineStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub frames_captured: u64,
    pub frames_dropped: u64,
    pub frames_processed: u64,
    pub audio_buffers: u64,
    pub audio_dropped: u64,
    pub clap_events: u64,
    pub commands_enqueued: u64,
    pub commands_dispatched: u64,
    pub actuator_failures: u64,
}

macro_rules! counter {
    ($name:ident, $field:ident) => {
        #[doc = concat!("Increment `", stringify!($field), "`")]
        pub fn $name(&self) {
            self.$field.fetch_add(1, Ordering::Relaxed);
        }
    };
}

impl PipelineStats {
    counter!(frame_captured, frames_captured);
    counter!(frame_dropped, frames_dropped);
    counter!(frame_processed, frames_processed);
    counter!(audio_buffer_captured, audio_buffers);
    counter!(audio_buffer_dropped, audio_dropped);
    counter!(clap_event, clap_events);
    counter!(command_enqueued, commands_enqueued);
    counter!(command_dispatched, commands_dispatched);

    /// Add `count` actuator failures
    pub fn actuator_failed(&self, count: u64) {
        self.actuator_failures.fetch_add(count, Ordering::Relaxed);
    }

    /// Read every counter
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            frames_captured: self.frames_captured.load(Ordering::Relaxed),
            frames_dropped: self.frames_dropped.load(Ordering::Relaxed),
            frames_processed: self.frames_processed.load(Ordering::Relaxed),
            audio_buffers: self.audio_buffers.load(Ordering::Relaxed),
            audio_dropped: self.audio_dropped.load(Ordering::Relaxed),
            clap_events: self.clap_events.load(Ordering::Relaxed),
            commands_enqueued: self.commands_enqueued.load(Ordering::Relaxed),
            commands_dispatched: self.commands_dispatched.load(Ordering::Relaxed),
            actuator_failures: self.actuator_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_counts() {
        let stats = PipelineStats::default();
        stats.frame_captured();
        stats.frame_captured();
        stats.frame_dropped();
        stats.actuator_failed(3);

        let snapshot = stats.snapshot();
        assert_eq!(snapshot.frames_captured, 2);
        assert_eq!(snapshot.frames_dropped, 1);
        assert_eq!(snapshot.actuator_failures, 3);
        assert_eq!(snapshot.commands_dispatched, 0);
    }
}
