//! Checked and clamping float-to-integer conversions

/// Clamp and convert f64 to u16, truncating toward zero
#[must_use]
// Clamping ensures safe truncation
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn f64_to_u16_clamp(value: f64, min: u16, max: u16) -> u16 {
    // Ensure min <= max
    let (min, max) = if min <= max { (min, max) } else { (max, min) };

    if value.is_nan() {
        return min;
    }

    let clamped = value.clamp(f64::from(min), f64::from(max));
    (clamped as u16).clamp(min, max)
}

/// Clamp and convert f64 to an i16 audio sample, rounding to nearest
#[must_use]
#[allow(clippy::cast_possible_truncation)] // Clamping ensures safe truncation
pub fn f64_to_i16_sample(value: f64) -> i16 {
    if value.is_nan() {
        return 0;
    }
    value
        .round()
        .clamp(f64::from(i16::MIN), f64::from(i16::MAX)) as i16
}
