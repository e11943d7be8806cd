//! Maps vertical hand separation to a brightness command.

use crate::{command::BrightnessCommand, constants, utils::safe_cast::f64_to_u16_clamp};

/// Stateless separation → brightness transform with a dead zone
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrightnessMapper {
    dead_zone: f64,
    scale_factor: f64,
    max_brightness: u16,
}

impl Default for BrightnessMapper {
    fn default() -> Self {
        Self::new(
            constants::DEFAULT_DEAD_ZONE_PX,
            constants::DEFAULT_BRIGHTNESS_SCALE,
            constants::MAX_BRIGHTNESS,
        )
    }
}

impl BrightnessMapper {
    #[must_use]
    pub const fn new(dead_zone: f64, scale_factor: f64, max_brightness: u16) -> Self {
        Self {
            dead_zone,
            scale_factor,
            max_brightness,
        }
    }

    /// Brightness for a vertical hand separation in pixels.
    ///
    /// Separations at or below the dead zone are noise and yield `None`.
    #[must_use]
    pub fn map(&self, height_diff: f64) -> Option<BrightnessCommand> {
        // Written so NaN also lands here
        if !(height_diff > self.dead_zone) {
            return None;
        }
        let level = f64_to_u16_clamp(height_diff * self.scale_factor, 0, self.max_brightness);
        Some(BrightnessCommand { level })
    }

    #[must_use]
    pub const fn dead_zone(&self) -> f64 {
        self.dead_zone
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dead_zone() {
        let mapper = BrightnessMapper::default();
        assert!(mapper.map(0.0).is_none());
        assert!(mapper.map(50.0).is_none());
        assert!(mapper.map(60.0).is_none());
        assert!(mapper.map(f64::NAN).is_none());
        assert!(mapper.map(60.5).is_some());
    }

    #[test]
    fn test_scaling_and_clamp() {
        let mapper = BrightnessMapper::default();
        assert_eq!(mapper.map(70.0), Some(BrightnessCommand { level: 22291 }));
        assert_eq!(mapper.map(206.0), Some(BrightnessCommand { level: 65535 }));
        assert_eq!(mapper.map(10_000.0), Some(BrightnessCommand { level: 65535 }));
        assert_eq!(mapper.map(f64::INFINITY), Some(BrightnessCommand { level: 65535 }));
    }
}
