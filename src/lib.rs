//! # Ebb: Multi-Mode Ramp Generator
//!
//! `ebb` is a per-sample ramp engine for modular synthesis. One instance
//! produces four related control signals from a single phase accumulator:
//! envelopes, free-running oscillators or gate-following attack/release
//! contours, bent by slope, shape and smoothness controls and laid out across
//! the outputs by one of four output modes.
//!
//! ## Signal Chain
//!
//! - **Phase/Ramp Engine** - AD one-shot, free-running Cycle or gate-following AR
//! - **Slope Shaper** - Linear phase to asymmetric rise/fall triangle
//! - **Waveshaper** - Exponential / linear / logarithmic curvature
//! - **Smoothness** - Lowpass below the midpoint, wavefolder above it
//! - **Output Router** - Gates, Amplitude, Slope/Phase or Frequency layout
//!
//! ## Quick Start
//!
//! ```rust
//! use ebb::prelude::*;
//!
//! let mut gen = RampGenerator::new(48000.0);
//! let controls = Controls::new()
//!     .with_ramp_mode(RampMode::Cycle)
//!     .with_output_mode(OutputMode::Gates);
//!
//! let mut block = [[0.0; NUM_CHANNELS]; 64];
//! gen.process_block(&controls, &BlockInputs::default(), &mut block);
//!
//! // Raw ramp on output 2 starts at the bottom of the ±5V range
//! assert_eq!(block[0][1], -5.0);
//! ```
//!
//! ## Features
//!
//! - `std` (default): standard library support, implies `alloc`
//! - `alloc`: JSON configuration through `serde_json`
//!
//! Without either feature the crate is `no_std` and allocation-free.

#![cfg_attr(all(not(feature = "std"), not(test)), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

/// Number of output channels
pub const NUM_CHANNELS: usize = 4;

pub mod config;
pub mod error;
pub mod gate;
pub mod generator;
pub mod module;
pub mod port;
pub mod ramp;
pub mod ratio;
pub mod router;
pub mod shaping;
pub mod smoother;
pub mod smoothness;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::NUM_CHANNELS;

    // Configuration
    pub use crate::config::{
        Controls, FreqRange, GeneratorConfig, OutputMode, RampMode, DEFAULT_GATE_THRESHOLD,
        DEFAULT_SAMPLE_RATE, DEFAULT_SMOOTHING_TIME_MS,
    };
    pub use crate::error::ConfigError;

    // Processing seam and signal conventions
    pub use crate::module::Module;
    pub use crate::port::{ModulatedParam, SignalKind};

    // Generator
    pub use crate::generator::{BlockInputs, Frame, FrameInput, RampGenerator};

    // Stages
    pub use crate::gate::{ClockState, ClockTracker, EdgeDetector, GateFlags};
    pub use crate::ramp::{RampEngine, RampState, Stage};
    pub use crate::ratio::{RatioSet, RatioTable, RATIO_SETS};
    pub use crate::router::{amplitude_gains, output_kinds};
    pub use crate::shaping::{slope_shape, waveshape};
    pub use crate::smoother::{ParamSmoother, ShapeParams, SmoothedParams};
    pub use crate::smoothness::{wavefold, FilterState};
}

// Re-export key types at crate root for convenience
pub use prelude::*;
