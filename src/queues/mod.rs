//! Bounded hand-off points between pipeline stages.
//!
//! The lossy queues never block their producer: a full frame buffer or audio
//! queue drops its oldest item. The command queue is lossless and applies
//! back-pressure instead.

/// Single-slot buffer holding only the newest camera frame
pub mod frame_buffer;

/// Bounded FIFO that drops its oldest item when full
pub mod drop_oldest;

/// Bounded, blocking FIFO of actuator commands
pub mod command_queue;

use std::sync::{LockResult, MutexGuard, PoisonError};

pub use command_queue::{command_queue, CommandReceiver, CommandSender};
pub use drop_oldest::DropOldestQueue;
pub use frame_buffer::FrameBuffer;

/// Queue of captured PCM buffers
pub type AudioQueue = DropOldestQueue<crate::audio::PcmBuffer>;

/// Queue contents stay consistent across a panicking holder, so a poisoned
/// lock is recovered rather than propagated.
pub(crate) fn recover<'a, T>(result: LockResult<MutexGuard<'a, T>>) -> MutexGuard<'a, T> {
    result.unwrap_or_else(PoisonError::into_inner)
}
