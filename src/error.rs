//! Configuration errors
//!
//! The DSP path never fails on finite input. Errors only surface where values
//! cross into the crate from a host: sample-rate metadata, raw selector indices
//! and serialized settings.

use core::fmt;

#[cfg(feature = "alloc")]
use alloc::string::String;

/// Errors produced while building or validating a generator configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Sample rate was zero, negative or not finite
    InvalidSampleRate(f64),
    /// Smoothing time constant was negative or not finite
    InvalidSmoothingTime(f64),
    /// Gate threshold was not finite
    InvalidGateThreshold(f64),
    /// Raw selector index did not name a ramp mode
    UnknownRampMode(u8),
    /// Raw selector index did not name a frequency range
    UnknownFreqRange(u8),
    /// Raw selector index did not name an output mode
    UnknownOutputMode(u8),
    /// Serialized settings could not be parsed
    #[cfg(feature = "alloc")]
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidSampleRate(sr) => write!(f, "Invalid sample rate: {}", sr),
            ConfigError::InvalidSmoothingTime(ms) => {
                write!(f, "Invalid smoothing time: {} ms", ms)
            }
            ConfigError::InvalidGateThreshold(t) => write!(f, "Invalid gate threshold: {}", t),
            ConfigError::UnknownRampMode(i) => write!(f, "Unknown ramp mode index {}", i),
            ConfigError::UnknownFreqRange(i) => write!(f, "Unknown frequency range index {}", i),
            ConfigError::UnknownOutputMode(i) => write!(f, "Unknown output mode index {}", i),
            #[cfg(feature = "alloc")]
            ConfigError::Parse(msg) => write!(f, "Parse failed: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}

#[cfg(feature = "alloc")]
impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        use alloc::string::ToString;
        ConfigError::Parse(err.to_string())
    }
}
