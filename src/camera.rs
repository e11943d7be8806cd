//! Camera abstraction and the capture stage feeding the frame buffer.

use crate::{error::Result, queues::FrameBuffer, shutdown::StopSignal, stats::PipelineStats};
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    /// 8-bit red, green, blue
    Rgb888,
    /// 8-bit blue, green, red
    Bgr888,
    /// 8-bit grayscale
    Gray8,
}

/// One image sample. Replaced, never mutated, once published.
#[derive(Debug, Clone)]
pub struct Frame {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    /// When the frame was captured
    pub timestamp: Instant,
    /// Position in the capture sequence, assigned by the capture stage
    pub sequence: u64,
    /// Raw pixel bytes, row-major
    pub data: Vec<u8>,
}

impl Frame {
    /// Create a frame stamped with the current time
    #[must_use]
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            format,
            timestamp: Instant::now(),
            sequence: 0,
            data,
        }
    }

    /// Set the capture sequence number
    #[must_use]
    pub const fn with_sequence(mut self, sequence: u64) -> Self {
        self.sequence = sequence;
        self
    }
}

/// Resolution and pixel format requested from the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub pixel_format: PixelFormat,
}

/// Camera device driver
pub trait Camera: Send {
    /// Configure and start the device
    fn start(&mut self, settings: &CaptureSettings) -> Result<()>;

    /// Capture the next frame, blocking at the device's native rate
    fn capture_frame(&mut self) -> Result<Frame>;

    /// Stop the device and release it
    fn stop(&mut self) -> Result<()>;
}

/// Capture stage: reads the camera and publishes into the frame buffer
pub struct FrameSource {
    camera: Box<dyn Camera>,
    buffer: Arc<FrameBuffer>,
    stats: Arc<PipelineStats>,
    capture_interval: Duration,
    retry_delay: Duration,
    next_sequence: u64,
}

impl FrameSource {
    /// Wrap an already started camera
    pub fn new(
        camera: Box<dyn Camera>,
        buffer: Arc<FrameBuffer>,
        stats: Arc<PipelineStats>,
        capture_interval: Duration,
        retry_delay: Duration,
    ) -> Self {
        Self {
            camera,
            buffer,
            stats,
            capture_interval,
            retry_delay,
            next_sequence: 1,
        }
    }

    /// Capture one frame and publish it, evicting any stale frame
    ///
    /// # Errors
    ///
    /// Returns the camera's error if the capture failed
    pub fn capture_once(&mut self) -> Result<()> {
        let frame = self.camera.capture_frame()?.with_sequence(self.next_sequence);
        self.next_sequence += 1;
        self.stats.frame_captured();

        if self.buffer.publish(frame) {
            self.stats.frame_dropped();
            debug!("Dropped stale frame before gesture extraction");
        }
        Ok(())
    }

    /// Capture until `stop` is requested, then stop the camera
    pub fn run(mut self, stop: &StopSignal) {
        info!("Camera capture loop started");
        while !stop.is_requested() {
            let pause = match self.capture_once() {
                Ok(()) => self.capture_interval,
                Err(e) => {
                    warn!("Failed to capture frame, retrying: {}", e);
                    self.retry_delay
                }
            };
            if stop.sleep(pause) {
                break;
            }
        }

        match self.camera.stop() {
            Ok(()) => info!("Camera stopped"),
            Err(e) => warn!("Failed to stop camera cleanly: {}", e),
        }
    }
}
