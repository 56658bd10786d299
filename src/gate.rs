//! Gate, trigger and clock detection
//!
//! Raw control voltages are turned into level/edge flags. A missing input is
//! never an error: it reads as permanently low, and the caller decides what
//! an unpatched gate means for its mode.

use crate::config::DEFAULT_GATE_THRESHOLD;
use crate::module::Module;

/// Shortest clock interval (in samples) accepted as a valid period
pub const MIN_CLOCK_PERIOD: u32 = 10;

/// Level and edge state of a gate input for one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GateFlags {
    /// Input is above threshold
    pub high: bool,
    /// Input crossed the threshold upward on this sample
    pub rising: bool,
    /// A cable is connected to the input
    pub patched: bool,
}

impl GateFlags {
    /// Flags for an unpatched input
    pub const UNPATCHED: GateFlags = GateFlags {
        high: false,
        rising: false,
        patched: false,
    };
}

/// Threshold detector with rising-edge output
#[derive(Debug, Clone, Copy)]
pub struct EdgeDetector {
    threshold: f64,
    was_high: bool,
}

impl EdgeDetector {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            was_high: false,
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn is_high(&self) -> bool {
        self.was_high
    }
}

impl Default for EdgeDetector {
    fn default() -> Self {
        Self::new(DEFAULT_GATE_THRESHOLD)
    }
}

impl Module for EdgeDetector {
    type In = Option<f64>;
    type Out = GateFlags;

    fn tick(&mut self, level: Option<f64>) -> GateFlags {
        let Some(level) = level else {
            self.was_high = false;
            return GateFlags::UNPATCHED;
        };

        // A non-finite reading holds the gate low rather than poisoning state
        let high = level.is_finite() && level > self.threshold;
        let rising = high && !self.was_high;
        self.was_high = high;

        GateFlags {
            high,
            rising,
            patched: true,
        }
    }

    fn reset(&mut self) {
        self.was_high = false;
    }
}

/// Clock state for one sample
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ClockState {
    /// Clock crossed the threshold upward on this sample
    pub rising: bool,
    /// Phase increment implied by the measured period, once locked
    pub increment: Option<f64>,
    /// Rising edges seen since the tracker was last reset
    pub edges: u32,
}

/// Measures the interval between clock edges.
///
/// The tracker locks once an interval longer than [`MIN_CLOCK_PERIOD`]
/// samples has been observed, and unlocks as soon as the clock input
/// disappears.
#[derive(Debug, Clone, Copy)]
pub struct ClockTracker {
    detector: EdgeDetector,
    counter: u32,
    period: Option<u32>,
    edges: u32,
}

impl ClockTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            detector: EdgeDetector::new(threshold),
            counter: 0,
            period: None,
            edges: 0,
        }
    }

    /// Measured clock period in samples
    pub fn period(&self) -> Option<u32> {
        self.period
    }

    pub fn is_locked(&self) -> bool {
        self.period.is_some()
    }
}

impl Default for ClockTracker {
    fn default() -> Self {
        Self::new(DEFAULT_GATE_THRESHOLD)
    }
}

impl Module for ClockTracker {
    type In = Option<f64>;
    type Out = ClockState;

    fn tick(&mut self, level: Option<f64>) -> ClockState {
        let flags = self.detector.tick(level);
        if !flags.patched {
            self.period = None;
            self.edges = 0;
            return ClockState::default();
        }

        if flags.rising {
            if self.counter > MIN_CLOCK_PERIOD {
                self.period = Some(self.counter);
            }
            self.counter = 0;
            self.edges = self.edges.wrapping_add(1);
        }
        self.counter = self.counter.saturating_add(1);

        ClockState {
            rising: flags.rising,
            increment: self.period.map(|p| 1.0 / f64::from(p)),
            edges: self.edges,
        }
    }

    fn reset(&mut self) {
        self.detector.reset();
        self.counter = 0;
        self.period = None;
        self.edges = 0;
    }
}
