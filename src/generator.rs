//! The ramp generator
//!
//! [`RampGenerator`] wires the stages together for one instance:
//!
//! ```text
//! gate/clock ──► EdgeDetector / ClockTracker ──► RampEngine (phase, stage)
//!                                                    │
//! knobs + CVs ──► ModulatedParam ──► SmoothedParams ─┤
//!                                                    ▼
//!                    Slope Shaper ─► Waveshaper ─► Smoothness ─► Router ─► 4 outputs
//! ```
//!
//! Each sample runs edge resets first, then computes outputs from the current
//! phase, then advances the phase.

use crate::config::{Controls, GeneratorConfig, OutputMode, DEFAULT_SAMPLE_RATE};
use crate::error::ConfigError;
use crate::gate::{ClockState, ClockTracker, EdgeDetector};
use crate::module::Module;
use crate::port::ModulatedParam;
use crate::ramp::{phase_increment, RampEngine, Stage, MAX_INCREMENT};
use crate::ratio::RatioTable;
use crate::router::{route, RouteInput};
use crate::smoother::{ShapeParams, SmoothedParams};
use crate::smoothness::FilterState;
use crate::NUM_CHANNELS;

/// One output frame: a voltage per output channel
pub type Frame = [f64; NUM_CHANNELS];

/// Input CVs for a single sample. `None` means nothing is patched.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameInput {
    pub gate: Option<f64>,
    pub clock: Option<f64>,
    /// 1 unit per octave
    pub pitch: Option<f64>,
    /// Scaled by `Controls::fm_amount`, 1 unit per octave at full amount
    pub fm: Option<f64>,
    pub shape: Option<f64>,
    pub slope: Option<f64>,
    pub smoothness: Option<f64>,
    pub shift: Option<f64>,
}

impl FrameInput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_gate(mut self, level: f64) -> Self {
        self.gate = Some(level);
        self
    }

    pub fn with_clock(mut self, level: f64) -> Self {
        self.clock = Some(level);
        self
    }
}

/// Per-sample input buffers for one block.
///
/// A field left as `None` is unpatched for the whole block. A slice shorter
/// than the block reads as unpatched past its end.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockInputs<'a> {
    pub gate: Option<&'a [f64]>,
    pub clock: Option<&'a [f64]>,
    pub pitch: Option<&'a [f64]>,
    pub fm: Option<&'a [f64]>,
    pub shape: Option<&'a [f64]>,
    pub slope: Option<&'a [f64]>,
    pub smoothness: Option<&'a [f64]>,
    pub shift: Option<&'a [f64]>,
}

#[inline]
fn sample(buffer: Option<&[f64]>, index: usize) -> Option<f64> {
    buffer.and_then(|b| b.get(index).copied())
}

impl BlockInputs<'_> {
    /// Inputs for sample `index` of the block
    pub fn frame(&self, index: usize) -> FrameInput {
        FrameInput {
            gate: sample(self.gate, index),
            clock: sample(self.clock, index),
            pitch: sample(self.pitch, index),
            fm: sample(self.fm, index),
            shape: sample(self.shape, index),
            slope: sample(self.slope, index),
            smoothness: sample(self.smoothness, index),
            shift: sample(self.shift, index),
        }
    }
}

/// Shaping targets after applying CVs through their attenuverters
fn shape_targets(controls: &Controls, input: &FrameInput) -> ShapeParams {
    ShapeParams {
        shape: ModulatedParam::new(controls.shape, controls.shape_atten)
            .with_cv(input.shape)
            .value(),
        slope: ModulatedParam::new(controls.slope, controls.slope_atten)
            .with_cv(input.slope)
            .value(),
        smoothness: ModulatedParam::new(controls.smoothness, controls.smoothness_atten)
            .with_cv(input.smoothness)
            .value(),
        shift: ModulatedParam::new(controls.shift, controls.shift_atten)
            .with_cv(input.shift)
            .value(),
    }
}

/// Clock multiplier selected by the frequency knob: whole octaves only
fn clock_multiplier(controls: &Controls) -> f64 {
    libm::exp2(libm::round(controls.frequency_octaves()))
}

/// Multi-mode ramp, envelope and oscillator generator.
///
/// All state (phases, stages, smoothers, filter memory, edge history) is
/// owned by the instance, so any number of generators can run side by side.
#[derive(Debug, Clone)]
pub struct RampGenerator {
    config: GeneratorConfig,
    engine: RampEngine,
    params: SmoothedParams,
    filter: FilterState,
    gate: EdgeDetector,
    clock: ClockTracker,
    ratios: RatioTable,
    output_mode: Option<OutputMode>,
}

impl RampGenerator {
    /// Create a generator at `sample_rate`.
    ///
    /// An invalid rate (zero, negative, not finite) falls back to
    /// [`DEFAULT_SAMPLE_RATE`].
    pub fn new(sample_rate: f64) -> Self {
        let sample_rate = if sample_rate.is_finite() && sample_rate > 0.0 {
            sample_rate
        } else {
            tracing::warn!(
                sample_rate,
                fallback = DEFAULT_SAMPLE_RATE,
                "invalid sample rate, using fallback"
            );
            DEFAULT_SAMPLE_RATE
        };
        Self::build(GeneratorConfig::new(sample_rate))
    }

    /// Create a generator from a validated configuration
    pub fn from_config(config: GeneratorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: GeneratorConfig) -> Self {
        Self {
            config,
            engine: RampEngine::new(),
            params: SmoothedParams::new(config.smoothing_time_ms, config.sample_rate),
            filter: FilterState::new(),
            gate: EdgeDetector::new(config.gate_threshold),
            clock: ClockTracker::new(config.gate_threshold),
            ratios: RatioTable::default(),
            output_mode: None,
        }
    }

    /// Replace the Frequency-mode ratio table
    pub fn with_ratio_table(mut self, ratios: RatioTable) -> Self {
        self.ratios = ratios;
        self
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    pub fn sample_rate(&self) -> f64 {
        self.config.sample_rate
    }

    pub fn phase(&self, channel: usize) -> f64 {
        self.engine.phase(channel)
    }

    pub fn stage(&self, channel: usize) -> Stage {
        self.engine.stage(channel)
    }

    /// Current smoothed shaping parameters
    pub fn params(&self) -> ShapeParams {
        self.params.current()
    }

    pub fn is_clock_locked(&self) -> bool {
        self.clock.is_locked()
    }

    /// Jump the smoothers straight to the knob values in `controls`.
    ///
    /// Useful when a host loads a preset and wants no initial glide.
    pub fn snap_params(&mut self, controls: &Controls) {
        self.params.snap(shape_targets(controls, &FrameInput::default()));
    }

    /// Process one block. Each output frame consumes the matching input
    /// sample; `controls` hold for the whole block.
    pub fn process_block(
        &mut self,
        controls: &Controls,
        inputs: &BlockInputs<'_>,
        output: &mut [Frame],
    ) {
        for (index, frame) in output.iter_mut().enumerate() {
            *frame = self.tick(controls, &inputs.frame(index));
        }
    }

    /// Process one sample
    pub fn tick(&mut self, controls: &Controls, input: &FrameInput) -> Frame {
        self.sync_output_mode(controls.output_mode);

        let params = self.params.tick(shape_targets(controls, input));
        let gate = self.gate.tick(input.gate);
        let clock = self.clock.tick(input.clock);

        let increment = self.primary_increment(controls, input, &clock);
        let (increments, active) =
            self.channel_increments(controls.output_mode, increment, params.shift);

        if gate.rising || self.clock_resync(controls, &clock) {
            self.engine.on_rising_edge(controls.ramp_mode);
        }

        let route_input = RouteInput {
            ramp_mode: controls.ramp_mode,
            params,
            state: self.engine.state(),
            increment: increments[0],
        };
        let out = route(controls.output_mode, &route_input, &mut self.filter);

        self.engine
            .advance(controls.ramp_mode, gate, params.slope, &increments[..active]);

        out
    }

    /// Reset phases, stages and filter memory when the output layout changes
    fn sync_output_mode(&mut self, mode: OutputMode) {
        match self.output_mode {
            Some(previous) if previous != mode => {
                tracing::debug!(?previous, current = ?mode, "output mode changed, resetting ramps");
                self.engine.reset();
                self.filter.clear();
            }
            _ => {}
        }
        self.output_mode = Some(mode);
    }

    fn primary_increment(
        &self,
        controls: &Controls,
        input: &FrameInput,
        clock: &ClockState,
    ) -> f64 {
        match clock.increment {
            Some(clock_increment) => {
                (clock_increment * clock_multiplier(controls)).clamp(0.0, MAX_INCREMENT)
            }
            None => phase_increment(
                controls.freq_range,
                controls.frequency_octaves(),
                input.pitch,
                input.fm,
                controls.fm_amount,
                self.config.sample_rate,
            ),
        }
    }

    /// Per-channel increments and how many channels advance
    fn channel_increments(&self, mode: OutputMode, increment: f64, shift: f64) -> (Frame, usize) {
        match mode {
            OutputMode::Frequency => {
                let ratios = self.ratios.select(shift);
                let increments =
                    ratios.map(|ratio| (increment * ratio).clamp(0.0, MAX_INCREMENT));
                (increments, NUM_CHANNELS)
            }
            OutputMode::Gates | OutputMode::Amplitude | OutputMode::SlopePhase => {
                let mut increments = [0.0; NUM_CHANNELS];
                increments[0] = increment;
                (increments, 1)
            }
        }
    }

    /// Whether a locked clock edge should restart the ramps.
    ///
    /// Multiples resync on every edge; divisions only every `1 / multiplier`
    /// edges so the slower ramp completes first.
    fn clock_resync(&self, controls: &Controls, clock: &ClockState) -> bool {
        if !clock.rising || clock.increment.is_none() {
            return false;
        }
        let multiplier = clock_multiplier(controls);
        if multiplier >= 1.0 {
            return true;
        }
        let divisor = libm::round(1.0 / multiplier) as u32;
        divisor <= 1 || clock.edges % divisor == 0
    }
}

impl Default for RampGenerator {
    fn default() -> Self {
        Self::build(GeneratorConfig::default())
    }
}

impl Module for RampGenerator {
    type In = (Controls, FrameInput);
    type Out = Frame;

    fn tick(&mut self, (controls, input): (Controls, FrameInput)) -> Frame {
        RampGenerator::tick(self, &controls, &input)
    }

    fn reset(&mut self) {
        self.engine.reset();
        self.params.reset();
        self.filter.clear();
        self.gate.reset();
        self.clock.reset();
        self.output_mode = None;
    }

    /// Invalid rates are ignored
    fn set_sample_rate(&mut self, sample_rate: f64) {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            tracing::warn!(sample_rate, "ignoring invalid sample rate");
            return;
        }
        self.config.sample_rate = sample_rate;
        self.params.set_sample_rate(sample_rate);
    }
}
