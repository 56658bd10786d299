//! Polyrhythmic frequency ratios for the Frequency output mode
//!
//! Each set holds one multiplier per output channel, applied to the primary
//! phase increment. Channel 0 always runs at the base rate so the first
//! output stays a usable reference.

use crate::NUM_CHANNELS;

/// A quadruple of per-channel frequency ratios
pub type RatioSet = [f64; NUM_CHANNELS];

/// Guard subtracted before flooring so `shift = 1.0` selects the last set
const INDEX_EPSILON: f64 = 1e-4;

/// Shipped ratio sets, from pure divisions through to pure multiplications
pub const RATIO_SETS: [RatioSet; 8] = [
    [1.0, 0.5, 0.25, 0.125],
    [1.0, 2.0 / 3.0, 0.5, 1.0 / 3.0],
    [1.0, 0.75, 0.5, 0.25],
    [1.0, 0.8, 0.6, 0.4],
    [1.0, 1.25, 1.5, 1.75],
    [1.0, 1.5, 2.0, 3.0],
    [1.0, 2.0, 3.0, 4.0],
    [1.0, 2.0, 4.0, 8.0],
];

/// Immutable table of ratio sets indexed by the shift control
#[derive(Debug, Clone, Copy)]
pub struct RatioTable {
    sets: &'static [RatioSet],
}

impl RatioTable {
    /// Wrap a table. An empty table falls back to unison ratios.
    pub const fn new(sets: &'static [RatioSet]) -> Self {
        Self { sets }
    }

    pub fn len(&self) -> usize {
        self.sets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }

    /// Set index for a shift value: `clamp(floor(shift * N - eps), 0, N - 1)`
    pub fn index_for(&self, shift: f64) -> usize {
        let n = self.sets.len();
        if n == 0 {
            return 0;
        }
        let scaled = libm::floor(shift.clamp(0.0, 1.0) * n as f64 - INDEX_EPSILON);
        if scaled <= 0.0 {
            0
        } else {
            (scaled as usize).min(n - 1)
        }
    }

    pub fn get(&self, index: usize) -> RatioSet {
        self.sets
            .get(index)
            .copied()
            .unwrap_or([1.0; NUM_CHANNELS])
    }

    /// Ratio set selected by a shift value
    pub fn select(&self, shift: f64) -> RatioSet {
        self.get(self.index_for(shift))
    }
}

impl Default for RatioTable {
    fn default() -> Self {
        Self::new(&RATIO_SETS)
    }
}
