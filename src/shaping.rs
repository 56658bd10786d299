//! Stateless ramp transforms
//!
//! A linear phase is first bent into an asymmetric triangle by the slope
//! control, then curved by the shape control. Both transforms keep the
//! endpoints fixed, so changing either control never moves the ramp's start
//! or end level.

/// Lower clamp for the slope shaper's pulse width
pub const MIN_PULSE_WIDTH: f64 = 0.001;

/// Upper clamp for the slope shaper's pulse width
pub const MAX_PULSE_WIDTH: f64 = 0.999;

/// Slope control clamped to a usable pulse width
#[inline]
pub fn pulse_width(slope: f64) -> f64 {
    slope.clamp(MIN_PULSE_WIDTH, MAX_PULSE_WIDTH)
}

/// Convert a linear phase into an asymmetric rise/fall ramp.
///
/// The ramp rises from 0 to 1 over `[0, pw)` and falls back to 0 over
/// `[pw, 1]`, where `pw` is the clamped slope. `slope` therefore sets the
/// rise:fall time ratio.
#[inline]
pub fn slope_shape(phase: f64, slope: f64) -> f64 {
    let pw = pulse_width(slope);
    if phase < pw {
        phase / pw
    } else {
        1.0 - (phase - pw) / (1.0 - pw)
    }
}

/// Apply an exponential / linear / logarithmic curve to `x` in 0–1.
///
/// - `shape = 0`: `x³` (exponential)
/// - `shape = 0.5`: identity
/// - `shape = 1`: `1 - (1 - x)³` (logarithmic)
///
/// Intermediate settings blend linearly between identity and the curve.
#[inline]
pub fn waveshape(x: f64, shape: f64) -> f64 {
    let shape = shape.clamp(0.0, 1.0);
    if shape < 0.5 {
        let amount = 1.0 - 2.0 * shape;
        let curve = x * x * x;
        x + amount * (curve - x)
    } else {
        let amount = 2.0 * (shape - 0.5);
        let inv = 1.0 - x;
        let curve = 1.0 - inv * inv * inv;
        x + amount * (curve - x)
    }
}
