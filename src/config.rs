//! Mode selectors, block controls and generator configuration
//!
//! [`Controls`] is the per-block control surface a host fills in from its
//! knobs and switches. [`GeneratorConfig`] holds the values fixed for the
//! lifetime of an instance. Both serialize with serde; JSON helpers are
//! available with the `alloc` feature.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

#[cfg(feature = "alloc")]
use alloc::string::String;

/// Default processing sample rate
pub const DEFAULT_SAMPLE_RATE: f64 = 48000.0;

/// Default parameter smoothing time constant (ms)
pub const DEFAULT_SMOOTHING_TIME_MS: f64 = 5.0;

/// Default gate/clock threshold, 1 V at 5 V per unit
pub const DEFAULT_GATE_THRESHOLD: f64 = 0.2;

/// Timing behaviour of the phase engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RampMode {
    /// One-shot attack/decay, retriggered by rising edges
    Ad,
    /// Free-running oscillator, hard-synced by rising edges
    #[default]
    Cycle,
    /// Attack while the gate is high, release when it falls
    Ar,
}

/// Base frequency selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FreqRange {
    Low,
    #[default]
    Medium,
    High,
}

impl FreqRange {
    /// Base frequency in Hz at zero transposition
    pub fn base_frequency(&self) -> f64 {
        match self {
            FreqRange::Low => 0.125,
            FreqRange::Medium => 2.0,
            // C3
            FreqRange::High => 130.81,
        }
    }
}

/// Layout of the four output channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OutputMode {
    /// Shaped ramp, raw ramp, end-of-attack and end-of-release gates
    #[default]
    Gates,
    /// One shaped signal panned across the four outputs
    Amplitude,
    /// Four phase-shifted copies of the shaped signal
    SlopePhase,
    /// Four copies running at polyrhythmic frequency ratios
    Frequency,
}

impl TryFrom<u8> for RampMode {
    type Error = ConfigError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(RampMode::Ad),
            1 => Ok(RampMode::Cycle),
            2 => Ok(RampMode::Ar),
            _ => Err(ConfigError::UnknownRampMode(index)),
        }
    }
}

impl TryFrom<u8> for FreqRange {
    type Error = ConfigError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(FreqRange::Low),
            1 => Ok(FreqRange::Medium),
            2 => Ok(FreqRange::High),
            _ => Err(ConfigError::UnknownFreqRange(index)),
        }
    }
}

impl TryFrom<u8> for OutputMode {
    type Error = ConfigError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        match index {
            0 => Ok(OutputMode::Gates),
            1 => Ok(OutputMode::Amplitude),
            2 => Ok(OutputMode::SlopePhase),
            3 => Ok(OutputMode::Frequency),
            _ => Err(ConfigError::UnknownOutputMode(index)),
        }
    }
}

/// Per-block controls: mode selectors, knob targets and attenuverters.
///
/// Knob targets are normalized (0–1) except `frequency`, which is an offset
/// in octaves. Attenuverters scale their CV input in -1..1. Out-of-range
/// values are clamped when read, never rejected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Controls {
    pub ramp_mode: RampMode,
    pub freq_range: FreqRange,
    pub output_mode: OutputMode,

    /// Frequency offset in octaves (-5 to 5)
    pub frequency: f64,
    pub shape: f64,
    pub slope: f64,
    pub smoothness: f64,
    pub shift: f64,

    pub fm_amount: f64,
    pub shape_atten: f64,
    pub slope_atten: f64,
    pub smoothness_atten: f64,
    pub shift_atten: f64,
}

impl Default for Controls {
    fn default() -> Self {
        Self {
            ramp_mode: RampMode::Cycle,
            freq_range: FreqRange::Medium,
            output_mode: OutputMode::Gates,
            frequency: 0.0,
            shape: 0.5,
            slope: 0.5,
            smoothness: 0.5,
            shift: 0.5,
            fm_amount: 0.0,
            shape_atten: 0.5,
            slope_atten: 0.5,
            smoothness_atten: 0.5,
            shift_atten: 0.5,
        }
    }
}

impl Controls {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ramp_mode(mut self, mode: RampMode) -> Self {
        self.ramp_mode = mode;
        self
    }

    pub fn with_freq_range(mut self, range: FreqRange) -> Self {
        self.freq_range = range;
        self
    }

    pub fn with_output_mode(mut self, mode: OutputMode) -> Self {
        self.output_mode = mode;
        self
    }

    pub fn with_frequency(mut self, octaves: f64) -> Self {
        self.frequency = octaves;
        self
    }

    pub fn with_shape(mut self, shape: f64) -> Self {
        self.shape = shape;
        self
    }

    pub fn with_slope(mut self, slope: f64) -> Self {
        self.slope = slope;
        self
    }

    pub fn with_smoothness(mut self, smoothness: f64) -> Self {
        self.smoothness = smoothness;
        self
    }

    pub fn with_shift(mut self, shift: f64) -> Self {
        self.shift = shift;
        self
    }

    /// Frequency offset clamped to ±5 octaves
    pub fn frequency_octaves(&self) -> f64 {
        if self.frequency.is_finite() {
            self.frequency.clamp(-5.0, 5.0)
        } else {
            0.0
        }
    }

    /// Serialize to JSON string
    #[cfg(feature = "alloc")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserialize from JSON string; missing fields take their defaults
    #[cfg(feature = "alloc")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Instance-lifetime configuration
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub sample_rate: f64,
    /// Time constant of the parameter smoother in milliseconds
    pub smoothing_time_ms: f64,
    /// Level above which gate and clock inputs read as high
    pub gate_threshold: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            sample_rate: DEFAULT_SAMPLE_RATE,
            smoothing_time_ms: DEFAULT_SMOOTHING_TIME_MS,
            gate_threshold: DEFAULT_GATE_THRESHOLD,
        }
    }
}

impl GeneratorConfig {
    pub fn new(sample_rate: f64) -> Self {
        Self {
            sample_rate,
            ..Self::default()
        }
    }

    pub fn with_smoothing_time(mut self, ms: f64) -> Self {
        self.smoothing_time_ms = ms;
        self
    }

    pub fn with_gate_threshold(mut self, threshold: f64) -> Self {
        self.gate_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sample_rate.is_finite() || self.sample_rate <= 0.0 {
            return Err(ConfigError::InvalidSampleRate(self.sample_rate));
        }
        if !self.smoothing_time_ms.is_finite() || self.smoothing_time_ms < 0.0 {
            return Err(ConfigError::InvalidSmoothingTime(self.smoothing_time_ms));
        }
        if !self.gate_threshold.is_finite() {
            return Err(ConfigError::InvalidGateThreshold(self.gate_threshold));
        }
        Ok(())
    }

    #[cfg(feature = "alloc")]
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse and validate a configuration
    #[cfg(feature = "alloc")]
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }
}
