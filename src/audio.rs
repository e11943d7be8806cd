//! Microphone abstraction and the capture stage feeding the audio queue.

use crate::{error::Result, queues::AudioQueue, shutdown::StopSignal, stats::PipelineStats};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Fixed-size block of mono 16-bit samples
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PcmBuffer {
    pub samples: Vec<i16>,
    pub sample_rate: u32,
    /// Position in the capture sequence, assigned by the capture stage
    pub sequence: u64,
}

impl PcmBuffer {
    /// Create a buffer with sequence number 0
    #[must_use]
    pub fn new(samples: Vec<i16>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
            sequence: 0,
        }
    }

    /// Playback length of the block
    #[must_use]
    pub fn duration(&self) -> Duration {
        if self.sample_rate == 0 {
            return Duration::ZERO;
        }
        Duration::from_secs_f64(self.samples.len() as f64 / f64::from(self.sample_rate))
    }
}

/// Microphone device driver
pub trait Microphone: Send {
    /// Open the input stream
    fn start(&mut self) -> Result<()>;

    /// Read the next fixed-length block, blocking at the device's rate
    fn read_samples(&mut self) -> Result<Vec<i16>>;

    /// Close the input stream and release the device
    fn stop(&mut self) -> Result<()>;

    /// Human readable device description for logging
    fn describe(&self) -> String;
}

/// Audio capture stage: reads the microphone and pushes into the audio queue
pub struct AudioSource {
    microphone: Box<dyn Microphone>,
    queue: Arc<AudioQueue>,
    stats: Arc<PipelineStats>,
    sample_rate: u32,
    retry_delay: Duration,
    next_sequence: u64,
}

impl AudioSource {
    /// Wrap an already started microphone
    pub fn new(
        microphone: Box<dyn Microphone>,
        queue: Arc<AudioQueue>,
        stats: Arc<PipelineStats>,
        sample_rate: u32,
        retry_delay: Duration,
    ) -> Self {
        Self {
            microphone,
            queue,
            stats,
            sample_rate,
            retry_delay,
            next_sequence: 1,
        }
    }

    /// Read one block and queue it, dropping the oldest block if the queue is full
    ///
    /// # Errors
    ///
    /// Returns the microphone's error if the read failed
    pub fn capture_once(&mut self) -> Result<()> {
        let samples = self.microphone.read_samples()?;
        let buffer = PcmBuffer {
            samples,
            sample_rate: self.sample_rate,
            sequence: self.next_sequence,
        };
        self.next_sequence += 1;
        self.stats.audio_buffer_captured();

        if let Some(dropped) = self.queue.push(buffer) {
            self.stats.audio_buffer_dropped();
            debug!("Audio queue full, dropped buffer {}", dropped.sequence);
        }
        Ok(())
    }

    /// Capture until `stop` is requested, then stop the microphone
    pub fn run(mut self, stop: &StopSignal) {
        info!("Audio capture loop started on {}", self.microphone.describe());
        while !stop.is_requested() {
            if let Err(e) = self.capture_once() {
                warn!("Failed to read audio, retrying: {}", e);
                if stop.sleep(self.retry_delay) {
                    break;
                }
            }
        }

        match self.microphone.stop() {
            Ok(()) => info!("Audio capture stopped"),
            Err(e) => warn!("Failed to stop audio capture cleanly: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_duration() {
        let buffer = PcmBuffer::new(vec![0; 4410], 44_100);
        assert_eq!(buffer.duration(), Duration::from_millis(100));
        assert_eq!(PcmBuffer::new(vec![0; 10], 0).duration(), Duration::ZERO);
    }
}
