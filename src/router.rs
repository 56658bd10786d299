//! Output routing
//!
//! One routing function per [`OutputMode`], each reading the same ramp state
//! and shaping chain but laying the result out differently across the four
//! outputs. All values returned are in volts.

use crate::config::{OutputMode, RampMode};
use crate::port::SignalKind;
use crate::ramp::{attack_boundary, RampState, Stage, END_THRESHOLD};
use crate::shaping::{slope_shape, waveshape};
use crate::smoother::ShapeParams;
use crate::smoothness::FilterState;
use crate::NUM_CHANNELS;

/// Phase offset between adjacent channels in Slope/Phase mode at full shift
pub const PHASE_SPREAD: f64 = 0.25;

/// Everything a routing function reads for one sample
#[derive(Debug, Clone, Copy)]
pub struct RouteInput<'a> {
    pub ramp_mode: RampMode,
    pub params: ShapeParams,
    pub state: &'a RampState,
    /// Primary channel phase increment for this sample
    pub increment: f64,
}

/// Voltage convention of the ramp outputs for a ramp mode
pub fn ramp_kind(mode: RampMode) -> SignalKind {
    match mode {
        RampMode::Cycle => SignalKind::CvBipolar,
        RampMode::Ad | RampMode::Ar => SignalKind::CvUnipolar,
    }
}

/// Voltage convention of each output channel
pub fn output_kinds(output: OutputMode, ramp: RampMode) -> [SignalKind; NUM_CHANNELS] {
    let kind = ramp_kind(ramp);
    match output {
        OutputMode::Gates => [kind, kind, SignalKind::Gate, SignalKind::Gate],
        OutputMode::Amplitude | OutputMode::SlopePhase | OutputMode::Frequency => {
            [kind; NUM_CHANNELS]
        }
    }
}

/// Crossfade gains spreading one signal across the four outputs.
///
/// `pos = 3 * shift` sweeps from output 1 to output 4; the gains always sum
/// to 1.
pub fn amplitude_gains(shift: f64) -> [f64; NUM_CHANNELS] {
    let pos = 3.0 * shift.clamp(0.0, 1.0);
    let mut gains = [0.0; NUM_CHANNELS];
    for (k, gain) in gains.iter_mut().enumerate().take(NUM_CHANNELS - 1) {
        *gain = (1.0 - libm::fabs(pos - k as f64)).clamp(0.0, 1.0);
    }
    gains[NUM_CHANNELS - 1] = (pos - 2.0).clamp(0.0, 1.0);
    gains
}

/// Route one sample according to `mode`
pub fn route(
    mode: OutputMode,
    input: &RouteInput<'_>,
    filter: &mut FilterState,
) -> [f64; NUM_CHANNELS] {
    match mode {
        OutputMode::Gates => route_gates(input, filter),
        OutputMode::Amplitude => route_amplitude(input, filter),
        OutputMode::SlopePhase => route_slope_phase(input, filter),
        OutputMode::Frequency => route_frequency(input, filter),
    }
}

/// Slope-shaped ramp before curvature and smoothing
#[inline]
fn raw_ramp(phase: f64, input: &RouteInput<'_>) -> f64 {
    slope_shape(phase, attack_boundary(input.ramp_mode, input.params.slope))
}

/// Full chain: slope shaper, waveshaper, smoothness on `channel`'s filter
#[inline]
fn shaped(phase: f64, input: &RouteInput<'_>, filter: &mut FilterState, channel: usize) -> f64 {
    let ramp = raw_ramp(phase, input);
    let curved = waveshape(ramp, input.params.shape);
    filter.process(channel, curved, input.params.smoothness)
}

#[inline]
fn emit(kind: SignalKind, normalized: f64) -> f64 {
    kind.clamp(kind.scale(normalized))
}

/// Primary phase moved ahead by `offset`.
///
/// Cycle wraps around. The one-shot modes clamp at 1.0 so every copy ends
/// where the envelope ends, and an envelope that has not started keeps all
/// copies at its start.
fn offset_phase(mode: RampMode, state: &RampState, offset: f64) -> f64 {
    let phase = state.phase(0);
    match mode {
        RampMode::Cycle => {
            let shifted = phase + offset;
            shifted - libm::floor(shifted)
        }
        RampMode::Ad | RampMode::Ar => {
            if state.stage(0) == Stage::Idle {
                phase
            } else {
                (phase + offset).min(1.0)
            }
        }
    }
}

/// Out1 shaped × attenuverter, Out2 raw ramp, Out3 EOA, Out4 EOR
pub fn route_gates(input: &RouteInput<'_>, filter: &mut FilterState) -> [f64; NUM_CHANNELS] {
    let kind = ramp_kind(input.ramp_mode);
    let phase = input.state.phase(0);

    let level = 2.0 * input.params.shift - 1.0;
    let (min, max) = kind.voltage_range();
    let bound = libm::fabs(min).max(max);
    let shaped_out = (kind.scale(shaped(phase, input, filter, 0)) * level).clamp(-bound, bound);

    let raw_out = emit(kind, raw_ramp(phase, input));

    let boundary = attack_boundary(input.ramp_mode, input.params.slope);
    let end_of_attack = phase >= boundary;
    let end_of_release = match input.ramp_mode {
        // Last sample before the phase wraps
        RampMode::Cycle => input.increment > 0.0 && phase + input.increment >= 1.0,
        RampMode::Ad | RampMode::Ar => phase >= END_THRESHOLD,
    };

    [
        shaped_out,
        raw_out,
        SignalKind::gate(end_of_attack),
        SignalKind::gate(end_of_release),
    ]
}

/// One shaped signal panned across all four outputs by `shift`
pub fn route_amplitude(input: &RouteInput<'_>, filter: &mut FilterState) -> [f64; NUM_CHANNELS] {
    let kind = ramp_kind(input.ramp_mode);
    let value = emit(kind, shaped(input.state.phase(0), input, filter, 0));
    amplitude_gains(input.params.shift).map(|gain| value * gain)
}

/// Four copies of the primary phase spread by `channel * shift * 0.25`
///
/// In AD and AR the copies clamp at the end of the envelope rather than
/// wrapping.
pub fn route_slope_phase(input: &RouteInput<'_>, filter: &mut FilterState) -> [f64; NUM_CHANNELS] {
    let kind = ramp_kind(input.ramp_mode);
    let spread = input.params.shift * PHASE_SPREAD;

    let mut out = [0.0; NUM_CHANNELS];
    for (channel, value) in out.iter_mut().enumerate() {
        let phase = if channel == 0 {
            input.state.phase(0)
        } else {
            offset_phase(input.ramp_mode, input.state, channel as f64 * spread)
        };
        *value = emit(kind, shaped(phase, input, filter, channel));
    }
    out
}

/// Four independently clocked accumulators, one per output
pub fn route_frequency(input: &RouteInput<'_>, filter: &mut FilterState) -> [f64; NUM_CHANNELS] {
    let kind = ramp_kind(input.ramp_mode);
    let mut out = [0.0; NUM_CHANNELS];
    for (channel, value) in out.iter_mut().enumerate() {
        let phase = input.state.phase(channel);
        *value = emit(kind, shaped(phase, input, filter, channel));
    }
    out
}
