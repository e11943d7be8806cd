//! Two-hand height gesture extraction.
//!
//! Every Nth frame is run through the landmark model. When both hands are
//! visible their centers are smoothed, and if the hands are roughly level the
//! vertical gap between them becomes the brightness signal.

use crate::{
    brightness::BrightnessMapper,
    camera::Frame,
    error::{Error, Result},
    landmarks::{HandLandmarks, LandmarkDetector},
    queues::{CommandSender, FrameBuffer},
    shutdown::StopSignal,
    smoothing::SmoothingState,
    stats::PipelineStats,
};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Center of one hand in frame-pixel coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandCenter {
    /// 0 or 1, by detection order
    pub index: usize,
    pub x: f64,
    pub y: f64,
}

impl HandCenter {
    #[must_use]
    pub const fn new(index: usize, x: f64, y: f64) -> Self {
        Self { index, x, y }
    }

    /// Midpoint of the wrist and middle-finger base, scaled to pixels
    #[must_use]
    pub fn from_landmarks(index: usize, hand: &HandLandmarks, width: u32, height: u32) -> Self {
        let x = (hand.wrist.x + hand.middle_finger_mcp.x) / 2.0 * f64::from(width);
        let y = (hand.wrist.y + hand.middle_finger_mcp.y) / 2.0 * f64::from(height);
        Self { index, x, y }
    }

    fn distance(&self, other: &Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// How raw hands are paired with the smoothed left/right slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandOrdering {
    /// First detected hand is left, second is right
    #[default]
    Positional,
    /// Pair raw hands with the nearest previous smoothed center
    Proximity,
}

/// Result of one gesture cycle
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureOutcome {
    /// Frame skipped by the cadence divisor
    Skipped,
    /// Landmark model failed; treated as no detection
    DetectorFailed,
    /// Fewer than two hands in this frame
    MissingHands { detected: usize },
    /// Hands too far apart horizontally to read a height gesture
    NotLevel { horizontal: f64 },
    /// Vertical separation of the smoothed hand centers
    Separation(f64),
}

impl GestureOutcome {
    /// Vertical separation, if this cycle produced one
    #[must_use]
    pub const fn separation(&self) -> Option<f64> {
        match self {
            Self::Separation(value) => Some(*value),
            _ => None,
        }
    }
}

/// Turns frames into vertical hand separation signals
pub struct GestureExtractor {
    detector: Box<dyn LandmarkDetector>,
    smoothing: SmoothingState,
    frame_divisor: u32,
    leeway: f64,
    ordering: HandOrdering,
    frame_count: u64,
}

impl GestureExtractor {
    /// Create an extractor processing every `frame_divisor`th frame
    ///
    /// # Panics
    ///
    /// Panics if `frame_divisor` is 0 or `alpha` is not in (0, 1)
    pub fn new(
        detector: Box<dyn LandmarkDetector>,
        frame_divisor: u32,
        alpha: f64,
        leeway: f64,
    ) -> Self {
        assert!(frame_divisor > 0, "Frame divisor must be greater than 0");
        Self {
            detector,
            smoothing: SmoothingState::new(alpha),
            frame_divisor,
            leeway,
            ordering: HandOrdering::Positional,
            frame_count: 0,
        }
    }

    /// Select how raw hands are paired with the smoothed slots
    #[must_use]
    pub fn with_ordering(mut self, ordering: HandOrdering) -> Self {
        self.ordering = ordering;
        self
    }

    /// Run one gesture cycle on `frame`
    pub fn process_frame(&mut self, frame: &Frame) -> GestureOutcome {
        self.frame_count += 1;
        if self.frame_count % u64::from(self.frame_divisor) != 0 {
            return GestureOutcome::Skipped;
        }

        let hands = match self.detector.process(frame) {
            Ok(hands) => hands,
            Err(e) => {
                warn!("Landmark detection failed on frame {}: {}", frame.sequence, e);
                return GestureOutcome::DetectorFailed;
            }
        };
        debug!("Frame {}: hands detected: {}", frame.sequence, hands.len());

        // Both hands must be present in the same cycle
        if hands.len() < 2 {
            return GestureOutcome::MissingHands { detected: hands.len() };
        }

        let (raw_left, raw_right) = self.pair_hands(
            HandCenter::from_landmarks(0, &hands[0], frame.width, frame.height),
            HandCenter::from_landmarks(1, &hands[1], frame.width, frame.height),
        );
        debug!(
            "Hand centers: left ({:.0}, {:.0}), right ({:.0}, {:.0})",
            raw_left.x, raw_left.y, raw_right.x, raw_right.y
        );

        let (left, right) = self.smoothing.update(raw_left, raw_right);
        debug!(
            "Smoothed centers: left ({:.0}, {:.0}), right ({:.0}, {:.0})",
            left.x, left.y, right.x, right.y
        );

        let horizontal = (right.x - left.x).abs();
        if horizontal >= self.leeway {
            debug!("Hands too far apart: {:.0} >= {:.0}", horizontal, self.leeway);
            return GestureOutcome::NotLevel { horizontal };
        }

        let vertical = (right.y - left.y).abs();
        debug!("Hands level, height difference: {:.0}", vertical);
        GestureOutcome::Separation(vertical)
    }

    fn pair_hands(&self, first: HandCenter, second: HandCenter) -> (HandCenter, HandCenter) {
        if self.ordering == HandOrdering::Positional {
            return (first, second);
        }
        let Some((prev_left, prev_right)) = self.smoothing.centers() else {
            return (first, second);
        };

        let keep = first.distance(&prev_left) + second.distance(&prev_right);
        let swap = second.distance(&prev_left) + first.distance(&prev_right);
        if swap < keep {
            debug!("Re-pairing hands by proximity to previous centers");
            (
                HandCenter::new(0, second.x, second.y),
                HandCenter::new(1, first.x, first.y),
            )
        } else {
            (first, second)
        }
    }

    /// Current smoothing state
    #[must_use]
    pub const fn smoothing(&self) -> &SmoothingState {
        &self.smoothing
    }

    /// Number of frames handed to this extractor, processed or skipped
    #[must_use]
    pub const fn frames_seen(&self) -> u64 {
        self.frame_count
    }

    /// Release the landmark model
    ///
    /// # Errors
    ///
    /// Returns the model's error if it failed to close
    pub fn close(&mut self) -> Result<()> {
        self.detector.close()
    }
}

/// Gesture stage: frame buffer → extractor → mapper → command queue
pub struct GestureStage {
    extractor: GestureExtractor,
    mapper: BrightnessMapper,
    frames: Arc<FrameBuffer>,
    commands: CommandSender,
    stats: Arc<PipelineStats>,
    idle_wait: Duration,
}

impl GestureStage {
    pub fn new(
        extractor: GestureExtractor,
        mapper: BrightnessMapper,
        frames: Arc<FrameBuffer>,
        commands: CommandSender,
        stats: Arc<PipelineStats>,
        idle_wait: Duration,
    ) -> Self {
        Self {
            extractor,
            mapper,
            frames,
            commands,
            stats,
            idle_wait,
        }
    }

    /// Interpret one frame and enqueue a brightness command if warranted.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutdownRequested`] or [`Error::QueueClosed`] if the
    /// command could not be enqueued
    pub fn handle_frame(&mut self, frame: &Frame, stop: &StopSignal) -> Result<GestureOutcome> {
        let outcome = self.extractor.process_frame(frame);
        if outcome == GestureOutcome::Skipped {
            return Ok(outcome);
        }
        self.stats.frame_processed();

        if let Some(height_diff) = outcome.separation() {
            match self.mapper.map(height_diff) {
                Some(command) => {
                    info!("Setting brightness to {}", command.level);
                    self.commands.enqueue_until(command.into(), stop)?;
                    self.stats.command_enqueued();
                }
                None => debug!(
                    "Height difference {:.0} <= {:.0}, brightness unchanged",
                    height_diff,
                    self.mapper.dead_zone()
                ),
            }
        }
        Ok(outcome)
    }

    /// Process frames until `stop` is requested, then close the landmark model
    pub fn run(mut self, stop: &StopSignal) {
        info!("Gesture extraction loop started");
        while !stop.is_requested() {
            let Some(frame) = self.frames.take_timeout(self.idle_wait) else {
                continue;
            };
            match self.handle_frame(&frame, stop) {
                Ok(_) => {}
                Err(Error::ShutdownRequested) => break,
                Err(e) => {
                    error!("Gesture stage cannot deliver commands: {}", e);
                    break;
                }
            }
        }

        match self.extractor.close() {
            Ok(()) => info!("Landmark detector closed"),
            Err(e) => warn!("Failed to close landmark detector: {}", e),
        }
    }
}
