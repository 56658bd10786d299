//! Phase/ramp engine
//!
//! Owns up to four phase accumulators and advances them according to the
//! selected [`RampMode`]:
//!
//! - **AD**: one-shot. A rising edge restarts from 0, the phase runs to 1.0
//!   and holds there until the next edge.
//! - **Cycle**: free-running, wrapped into `[0, 1)`. A rising edge hard-syncs
//!   the phase to 0.
//! - **AR**: gate-following. The attack half `[0, 0.5]` runs while the gate
//!   is high and holds at the apex; the release half `[0.5, 1]` runs once the
//!   gate falls and holds at 1.0. With no gate patched, AR loops like Cycle.

use crate::config::{FreqRange, RampMode};
use crate::gate::GateFlags;
use crate::shaping::pulse_width;
use crate::NUM_CHANNELS;

/// Highest phase increment per sample (Nyquist)
pub const MAX_INCREMENT: f64 = 0.5;

/// Transposition limit in octaves either side of the base frequency
pub const MAX_TRANSPOSE_OCTAVES: f64 = 10.0;

/// Boundary between attack and release in AR mode
pub const AR_APEX: f64 = 0.5;

/// Phase at or beyond which an envelope counts as finished
pub const END_THRESHOLD: f64 = 0.999;

/// Slope clamp used for AR rate division
const AR_SLOPE_MIN: f64 = 0.01;
const AR_SLOPE_MAX: f64 = 0.99;

/// Envelope stage of one phase accumulator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Stage {
    /// Not started since the last reset
    #[default]
    Idle,
    /// Phase below the attack boundary and moving
    Attack,
    /// AR apex hold while the gate stays high
    Sustain,
    /// Phase past the attack boundary and moving, or AR with the gate low
    Release,
    /// Phase held at 1.0 awaiting a new trigger or gate
    End,
}

impl Stage {
    pub fn is_running(&self) -> bool {
        matches!(self, Stage::Attack | Stage::Release)
    }
}

/// Phase where the attack segment ends for a ramp mode
#[inline]
pub fn attack_boundary(mode: RampMode, slope: f64) -> f64 {
    match mode {
        RampMode::Ad | RampMode::Cycle => pulse_width(slope),
        RampMode::Ar => AR_APEX,
    }
}

/// Phase increment per sample for the primary channel.
///
/// `octaves` is the frequency knob offset, `pitch` the 1 unit/octave pitch CV
/// and `fm` the FM CV scaled by `fm_amount`. Absent CVs contribute nothing.
pub fn phase_increment(
    range: FreqRange,
    octaves: f64,
    pitch: Option<f64>,
    fm: Option<f64>,
    fm_amount: f64,
    sample_rate: f64,
) -> f64 {
    let pitch = pitch.filter(|v| v.is_finite()).unwrap_or(0.0);
    let fm = fm.filter(|v| v.is_finite()).unwrap_or(0.0);
    let fm_amount = if fm_amount.is_finite() {
        fm_amount.clamp(-1.0, 1.0)
    } else {
        0.0
    };

    let transpose = (octaves + pitch + fm * fm_amount)
        .clamp(-MAX_TRANSPOSE_OCTAVES, MAX_TRANSPOSE_OCTAVES);
    let frequency = range.base_frequency() * libm::exp2(transpose);
    (frequency / sample_rate).clamp(0.0, MAX_INCREMENT)
}

/// Phase accumulators and their stages
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RampState {
    phase: [f64; NUM_CHANNELS],
    stage: [Stage; NUM_CHANNELS],
}

impl RampState {
    pub fn phase(&self, channel: usize) -> f64 {
        self.phase.get(channel).copied().unwrap_or(0.0)
    }

    pub fn stage(&self, channel: usize) -> Stage {
        self.stage.get(channel).copied().unwrap_or_default()
    }

    pub fn phases(&self) -> &[f64; NUM_CHANNELS] {
        &self.phase
    }
}

/// The per-sample timing state machine
#[derive(Debug, Clone, Copy, Default)]
pub struct RampEngine {
    state: RampState,
}

impl RampEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &RampState {
        &self.state
    }

    pub fn phase(&self, channel: usize) -> f64 {
        self.state.phase(channel)
    }

    pub fn stage(&self, channel: usize) -> Stage {
        self.state.stage(channel)
    }

    pub fn reset(&mut self) {
        self.state = RampState::default();
    }

    /// Restart every accumulator from 0 in the attack stage
    pub fn retrigger(&mut self) {
        self.state.phase = [0.0; NUM_CHANNELS];
        self.state.stage = [Stage::Attack; NUM_CHANNELS];
    }

    /// Apply a rising gate edge.
    ///
    /// AD retriggers and Cycle hard-syncs. AR ignores edges: a gate going
    /// high again resumes the attack from the current phase.
    pub fn on_rising_edge(&mut self, mode: RampMode) {
        match mode {
            RampMode::Ad | RampMode::Cycle => self.retrigger(),
            RampMode::Ar => {}
        }
    }

    /// Advance the first `increments.len()` accumulators by one sample.
    pub fn advance(&mut self, mode: RampMode, gate: GateFlags, slope: f64, increments: &[f64]) {
        let boundary = attack_boundary(mode, slope);
        for (channel, &inc) in increments.iter().enumerate().take(NUM_CHANNELS) {
            let phase = &mut self.state.phase[channel];
            let stage = &mut self.state.stage[channel];
            match mode {
                RampMode::Ad => advance_ad(phase, stage, inc, boundary),
                RampMode::Cycle => advance_cycle(phase, stage, inc, boundary),
                RampMode::Ar => advance_ar(phase, stage, inc, slope, gate),
            }
        }
    }
}

fn wrap(phase: &mut f64) {
    while *phase >= 1.0 {
        *phase -= 1.0;
    }
}

fn advance_ad(phase: &mut f64, stage: &mut Stage, inc: f64, boundary: f64) {
    if !stage.is_running() {
        return;
    }
    *phase += inc;
    if *phase >= 1.0 {
        *phase = 1.0;
        *stage = Stage::End;
    } else if *phase < boundary {
        *stage = Stage::Attack;
    } else {
        *stage = Stage::Release;
    }
}

fn advance_cycle(phase: &mut f64, stage: &mut Stage, inc: f64, boundary: f64) {
    *phase += inc;
    wrap(phase);
    *stage = if *phase < boundary {
        Stage::Attack
    } else {
        Stage::Release
    };
}

fn advance_ar(phase: &mut f64, stage: &mut Stage, inc: f64, slope: f64, gate: GateFlags) {
    let attack_rate = inc / slope.clamp(AR_SLOPE_MIN, AR_SLOPE_MAX);
    let release_rate = inc / (1.0 - slope).clamp(AR_SLOPE_MIN, AR_SLOPE_MAX);

    if !gate.patched {
        // Free-run through both halves
        *phase += if *phase < AR_APEX {
            attack_rate
        } else {
            release_rate
        };
        wrap(phase);
        *stage = if *phase < AR_APEX {
            Stage::Attack
        } else {
            Stage::Release
        };
    } else if gate.high {
        *phase = (*phase + attack_rate).min(AR_APEX);
        *stage = if *phase >= AR_APEX {
            Stage::Sustain
        } else {
            Stage::Attack
        };
    } else {
        *phase = (*phase + release_rate).min(1.0);
        *stage = if *phase >= 1.0 {
            Stage::End
        } else {
            Stage::Release
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const GATE_HIGH: GateFlags = GateFlags {
        high: true,
        rising: false,
        patched: true,
    };
    const GATE_LOW: GateFlags = GateFlags {
        high: false,
        rising: false,
        patched: true,
    };

    #[test]
    fn test_phase_increment_base() {
        let inc = phase_increment(FreqRange::Medium, 0.0, None, None, 0.0, 48000.0);
        assert_relative_eq!(inc, 2.0 / 48000.0);
    }

    #[test]
    fn test_phase_increment_octaves() {
        let up = phase_increment(FreqRange::Low, 1.0, None, None, 0.0, 1000.0);
        assert_relative_eq!(up, 0.25 / 1000.0, epsilon = 1e-15);

        let pitched = phase_increment(FreqRange::Low, 0.0, Some(-1.0), None, 0.0, 1000.0);
        assert_relative_eq!(pitched, 0.0625 / 1000.0, epsilon = 1e-15);

        // FM is scaled by its amount
        let fm = phase_increment(FreqRange::Low, 0.0, None, Some(2.0), 0.5, 1000.0);
        assert_relative_eq!(fm, 0.25 / 1000.0, epsilon = 1e-15);
    }

    #[test]
    fn test_phase_increment_clamped() {
        let inc = phase_increment(FreqRange::High, 5.0, Some(20.0), None, 0.0, 48000.0);
        assert_eq!(inc, MAX_INCREMENT);

        let inc = phase_increment(FreqRange::Low, -5.0, Some(-50.0), None, 0.0, 48000.0);
        assert!(inc > 0.0 && inc.is_finite());
    }

    #[test]
    fn test_ad_idle_until_triggered() {
        let mut engine = RampEngine::new();
        for _ in 0..100 {
            engine.advance(RampMode::Ad, GateFlags::UNPATCHED, 0.5, &[0.01]);
        }
        assert_eq!(engine.phase(0), 0.0);
        assert_eq!(engine.stage(0), Stage::Idle);
    }

    #[test]
    fn test_ad_runs_to_end_and_holds() {
        let mut engine = RampEngine::new();
        engine.on_rising_edge(RampMode::Ad);
        assert_eq!(engine.stage(0), Stage::Attack);

        let mut previous = engine.phase(0);
        let mut reached_end = false;
        for _ in 0..500 {
            engine.advance(RampMode::Ad, GATE_LOW, 0.5, &[0.01]);
            let phase = engine.phase(0);
            assert!(phase >= previous);
            if reached_end {
                assert_eq!(phase, 1.0);
            }
            reached_end |= phase == 1.0;
            previous = phase;
        }
        assert!(reached_end);
        assert_eq!(engine.stage(0), Stage::End);

        engine.on_rising_edge(RampMode::Ad);
        assert_eq!(engine.phase(0), 0.0);
    }

    #[test]
    fn test_ad_stage_follows_slope() {
        let mut engine = RampEngine::new();
        engine.on_rising_edge(RampMode::Ad);
        for _ in 0..30 {
            engine.advance(RampMode::Ad, GATE_LOW, 0.25, &[0.01]);
        }
        assert_eq!(engine.stage(0), Stage::Release);
    }

    #[test]
    fn test_cycle_wraps() {
        let mut engine = RampEngine::new();
        for _ in 0..1000 {
            engine.advance(RampMode::Cycle, GateFlags::UNPATCHED, 0.5, &[0.3]);
            let phase = engine.phase(0);
            assert!((0.0..1.0).contains(&phase));
        }
    }

    #[test]
    fn test_cycle_hard_sync() {
        let mut engine = RampEngine::new();
        for _ in 0..7 {
            engine.advance(RampMode::Cycle, GateFlags::UNPATCHED, 0.5, &[0.1]);
        }
        assert!(engine.phase(0) > 0.5);
        engine.on_rising_edge(RampMode::Cycle);
        assert_eq!(engine.phase(0), 0.0);
    }

    #[test]
    fn test_ar_attack_holds_at_apex() {
        let mut engine = RampEngine::new();
        for _ in 0..200 {
            engine.advance(RampMode::Ar, GATE_HIGH, 0.5, &[0.01]);
        }
        assert_eq!(engine.phase(0), AR_APEX);
        assert_eq!(engine.stage(0), Stage::Sustain);
    }

    #[test]
    fn test_ar_release_holds_at_end() {
        let mut engine = RampEngine::new();
        for _ in 0..200 {
            engine.advance(RampMode::Ar, GATE_HIGH, 0.5, &[0.01]);
        }
        for _ in 0..200 {
            engine.advance(RampMode::Ar, GATE_LOW, 0.5, &[0.01]);
        }
        assert_eq!(engine.phase(0), 1.0);
        assert_eq!(engine.stage(0), Stage::End);
    }

    #[test]
    fn test_ar_slope_sets_rates() {
        // slope 0.25: attack at 4x the base rate, release at 4/3x
        let mut engine = RampEngine::new();
        engine.advance(RampMode::Ar, GATE_HIGH, 0.25, &[0.01]);
        assert_relative_eq!(engine.phase(0), 0.04, epsilon = 1e-12);

        for _ in 0..20 {
            engine.advance(RampMode::Ar, GATE_HIGH, 0.25, &[0.01]);
        }
        engine.advance(RampMode::Ar, GATE_LOW, 0.25, &[0.01]);
        assert_relative_eq!(engine.phase(0), 0.5 + 0.01 / 0.75, epsilon = 1e-12);
    }

    #[test]
    fn test_ar_extreme_slope_finite() {
        let mut engine = RampEngine::new();
        for slope in [0.0, 1.0] {
            for _ in 0..10 {
                engine.advance(RampMode::Ar, GATE_HIGH, slope, &[0.001]);
                engine.advance(RampMode::Ar, GATE_LOW, slope, &[0.001]);
                assert!(engine.phase(0).is_finite());
            }
        }
    }

    #[test]
    fn test_ar_gate_high_does_not_reset() {
        let mut engine = RampEngine::new();
        for _ in 0..100 {
            engine.advance(RampMode::Ar, GATE_HIGH, 0.5, &[0.01]);
        }
        for _ in 0..10 {
            engine.advance(RampMode::Ar, GATE_LOW, 0.5, &[0.01]);
        }
        let released = engine.phase(0);
        assert!(released > AR_APEX);

        // A new edge is ignored; attack resumes from the held phase and
        // clamps straight to the apex
        engine.on_rising_edge(RampMode::Ar);
        assert_eq!(engine.phase(0), released);
        engine.advance(RampMode::Ar, GATE_HIGH, 0.5, &[0.01]);
        assert_eq!(engine.phase(0), AR_APEX);
    }

    #[test]
    fn test_ar_low_gate_from_start_releases() {
        // A patched gate that never went high still runs the release half
        let mut engine = RampEngine::new();
        engine.advance(RampMode::Ar, GATE_LOW, 0.5, &[0.01]);
        assert_relative_eq!(engine.phase(0), 0.02, epsilon = 1e-12);
        assert_eq!(engine.stage(0), Stage::Release);

        for _ in 0..100 {
            engine.advance(RampMode::Ar, GATE_LOW, 0.5, &[0.01]);
        }
        assert_eq!(engine.phase(0), 1.0);
        assert_eq!(engine.stage(0), Stage::End);
    }

    #[test]
    fn test_ar_unpatched_free_runs() {
        let mut engine = RampEngine::new();
        let mut wrapped = false;
        let mut previous = 0.0;
        for _ in 0..300 {
            engine.advance(RampMode::Ar, GateFlags::UNPATCHED, 0.5, &[0.01]);
            let phase = engine.phase(0);
            wrapped |= phase < previous;
            previous = phase;
        }
        assert!(wrapped);
    }

    #[test]
    fn test_independent_channel_rates() {
        let mut engine = RampEngine::new();
        engine.retrigger();
        for _ in 0..10 {
            engine.advance(RampMode::Cycle, GateFlags::UNPATCHED, 0.5, &[0.02, 0.01]);
        }
        assert_relative_eq!(engine.phase(0), 0.2, epsilon = 1e-12);
        assert_relative_eq!(engine.phase(1), 0.1, epsilon = 1e-12);
        assert_eq!(engine.phase(2), 0.0);
    }
}
