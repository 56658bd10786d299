//! One-pole parameter smoothing
//!
//! Knob and CV targets change in steps; the smoother turns each step into an
//! exponential glide so shape, slope, smoothness and shift never click.

use crate::config::DEFAULT_SMOOTHING_TIME_MS;
use crate::module::Module;
use libm::Libm;

/// Exponential (one-pole) smoother
///
/// `next = current + k * (target - current)` with
/// `k = 1 - exp(-1 / (tau * sample_rate))`.
#[derive(Debug, Clone, Copy)]
pub struct ParamSmoother {
    current: f64,
    coefficient: f64,
    time_ms: f64,
    sample_rate: f64,
}

impl ParamSmoother {
    pub fn new(initial: f64, time_ms: f64, sample_rate: f64) -> Self {
        Self {
            current: initial,
            coefficient: Self::coefficient_for(time_ms, sample_rate),
            time_ms,
            sample_rate,
        }
    }

    fn coefficient_for(time_ms: f64, sample_rate: f64) -> f64 {
        let samples = time_ms * 0.001 * sample_rate;
        if samples <= 1.0 {
            // Shorter than a sample: jump straight to the target
            1.0
        } else {
            1.0 - Libm::<f64>::exp(-1.0 / samples)
        }
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.current
    }

    pub fn coefficient(&self) -> f64 {
        self.coefficient
    }

    /// Jump to a value without gliding
    pub fn snap(&mut self, value: f64) {
        self.current = value;
    }

    pub fn set_time(&mut self, time_ms: f64) {
        self.time_ms = time_ms;
        self.coefficient = Self::coefficient_for(time_ms, self.sample_rate);
    }
}

impl Default for ParamSmoother {
    fn default() -> Self {
        Self::new(0.5, DEFAULT_SMOOTHING_TIME_MS, crate::config::DEFAULT_SAMPLE_RATE)
    }
}

impl Module for ParamSmoother {
    type In = f64;
    type Out = f64;

    #[inline]
    fn tick(&mut self, target: f64) -> f64 {
        self.current += self.coefficient * (target - self.current);
        self.current
    }

    fn reset(&mut self) {
        self.current = 0.5;
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.sample_rate = sample_rate;
        self.coefficient = Self::coefficient_for(self.time_ms, sample_rate);
    }
}

/// Smoothed values of the four shaping controls
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShapeParams {
    pub shape: f64,
    pub slope: f64,
    pub smoothness: f64,
    pub shift: f64,
}

impl Default for ShapeParams {
    fn default() -> Self {
        Self {
            shape: 0.5,
            slope: 0.5,
            smoothness: 0.5,
            shift: 0.5,
        }
    }
}

/// Four independent smoothers, one per shaping control.
///
/// Every field starts at the neutral midpoint 0.5.
#[derive(Debug, Clone, Copy)]
pub struct SmoothedParams {
    shape: ParamSmoother,
    slope: ParamSmoother,
    smoothness: ParamSmoother,
    shift: ParamSmoother,
}

impl SmoothedParams {
    pub fn new(time_ms: f64, sample_rate: f64) -> Self {
        let smoother = ParamSmoother::new(0.5, time_ms, sample_rate);
        Self {
            shape: smoother,
            slope: smoother,
            smoothness: smoother,
            shift: smoother,
        }
    }

    pub fn current(&self) -> ShapeParams {
        ShapeParams {
            shape: self.shape.value(),
            slope: self.slope.value(),
            smoothness: self.smoothness.value(),
            shift: self.shift.value(),
        }
    }

    /// Jump every smoother to its target
    pub fn snap(&mut self, targets: ShapeParams) {
        self.shape.snap(targets.shape.clamp(0.0, 1.0));
        self.slope.snap(targets.slope.clamp(0.0, 1.0));
        self.smoothness.snap(targets.smoothness.clamp(0.0, 1.0));
        self.shift.snap(targets.shift.clamp(0.0, 1.0));
    }
}

impl Default for SmoothedParams {
    fn default() -> Self {
        Self::new(DEFAULT_SMOOTHING_TIME_MS, crate::config::DEFAULT_SAMPLE_RATE)
    }
}

impl Module for SmoothedParams {
    type In = ShapeParams;
    type Out = ShapeParams;

    /// Targets are clamped to 0–1 first, so the glide never leaves that range.
    fn tick(&mut self, targets: ShapeParams) -> ShapeParams {
        ShapeParams {
            shape: self.shape.tick(targets.shape.clamp(0.0, 1.0)),
            slope: self.slope.tick(targets.slope.clamp(0.0, 1.0)),
            smoothness: self.smoothness.tick(targets.smoothness.clamp(0.0, 1.0)),
            shift: self.shift.tick(targets.shift.clamp(0.0, 1.0)),
        }
    }

    fn reset(&mut self) {
        self.shape.reset();
        self.slope.reset();
        self.smoothness.reset();
        self.shift.reset();
    }

    fn set_sample_rate(&mut self, sample_rate: f64) {
        self.shape.set_sample_rate(sample_rate);
        self.slope.set_sample_rate(sample_rate);
        self.smoothness.set_sample_rate(sample_rate);
        self.shift.set_sample_rate(sample_rate);
    }
}
