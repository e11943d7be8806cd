//! Hand landmark model interface.

use crate::{camera::Frame, error::Result};

/// Landmark position relative to the image, each axis in [0, 1]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NormalizedPoint {
    pub x: f64,
    pub y: f64,
}

impl NormalizedPoint {
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Landmarks of one detected hand needed to locate its center
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandLandmarks {
    pub wrist: NormalizedPoint,
    /// Base knuckle of the middle finger
    pub middle_finger_mcp: NormalizedPoint,
}

/// Hand landmark model.
///
/// Hands are returned in the model's detection order; that order, not
/// anatomical handedness, decides which hand is "left".
pub trait LandmarkDetector: Send {
    /// Detect up to two hands in `frame`
    fn process(&mut self, frame: &Frame) -> Result<Vec<HandLandmarks>>;

    /// Release the model
    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}
