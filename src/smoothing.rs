//! Exponential smoothing of hand centers.

use crate::gesture::HandCenter;

/// Exponential smoothing filter over a 2D point
#[derive(Debug, Clone)]
pub struct ExponentialFilter {
    alpha: f64,
    last: Option<(f64, f64)>,
}

impl ExponentialFilter {
    /// Create a filter giving weight `alpha` to each new sample
    ///
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1)
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        assert!(alpha > 0.0 && alpha < 1.0, "Alpha must be in (0, 1)");
        Self { alpha, last: None }
    }

    /// Blend a new sample into the filter. The first sample passes through.
    pub fn apply(&mut self, x: f64, y: f64) -> (f64, f64) {
        let filtered = match self.last {
            Some((last_x, last_y)) => (
                self.alpha.mul_add(x - last_x, last_x),
                self.alpha.mul_add(y - last_y, last_y),
            ),
            None => (x, y),
        };
        self.last = Some(filtered);
        filtered
    }

    /// Most recent filtered value
    #[must_use]
    pub const fn last(&self) -> Option<(f64, f64)> {
        self.last
    }
}

/// Previous smoothed left/right hand centers.
///
/// Empty until the first cycle with two hands, then frozen whenever fewer than
/// two hands are seen. Owned by the gesture stage alone.
#[derive(Debug, Clone)]
pub struct SmoothingState {
    left: ExponentialFilter,
    right: ExponentialFilter,
}

impl SmoothingState {
    /// # Panics
    ///
    /// Panics if alpha is not in the range (0, 1)
    #[must_use]
    pub fn new(alpha: f64) -> Self {
        Self {
            left: ExponentialFilter::new(alpha),
            right: ExponentialFilter::new(alpha),
        }
    }

    /// Blend raw centers into the state and return the smoothed pair.
    ///
    /// The first observation seeds the state with the raw centers.
    pub fn update(
        &mut self,
        raw_left: HandCenter,
        raw_right: HandCenter,
    ) -> (HandCenter, HandCenter) {
        let (lx, ly) = self.left.apply(raw_left.x, raw_left.y);
        let (rx, ry) = self.right.apply(raw_right.x, raw_right.y);
        (HandCenter::new(0, lx, ly), HandCenter::new(1, rx, ry))
    }

    /// Smoothed left hand center, if seeded
    #[must_use]
    pub fn left(&self) -> Option<HandCenter> {
        self.left.last().map(|(x, y)| HandCenter::new(0, x, y))
    }

    /// Smoothed right hand center, if seeded
    #[must_use]
    pub fn right(&self) -> Option<HandCenter> {
        self.right.last().map(|(x, y)| HandCenter::new(1, x, y))
    }

    /// Both smoothed centers, if seeded
    #[must_use]
    pub fn centers(&self) -> Option<(HandCenter, HandCenter)> {
        self.left().zip(self.right())
    }
}
