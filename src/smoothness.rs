//! Smoothness processing: lowpass below the midpoint, wavefolding above it
//!
//! Filter memory lives in [`FilterState`], one accumulator per output
//! channel, owned by the generator instance that uses it.

use crate::NUM_CHANNELS;

/// Upper bound on reflections performed by [`fold`]
pub const MAX_FOLD_ITERATIONS: u32 = 16;

/// Largest pre-gain applied before folding (`1 + 3 * fold_amount`)
pub const MAX_FOLD_GAIN: f64 = 4.0;

/// Reflect `v` back into `[-1, 1]`.
///
/// Each reflection of a value outside the band either lands inside it or
/// leaves it exactly 2.0 closer, so any `|v| <= 2 * MAX_FOLD_ITERATIONS - 1`
/// settles within the iteration bound. With a unipolar input and
/// [`MAX_FOLD_GAIN`] the worst case is `|v| = 16`, which needs 8.
///
/// Returns the folded value and the number of reflections performed.
pub fn fold(v: f64) -> (f64, u32) {
    let mut y = v;
    let mut iterations = 0;

    while (y > 1.0 || y < -1.0) && iterations < MAX_FOLD_ITERATIONS {
        if y > 1.0 {
            y = 2.0 - y;
        } else {
            y = -2.0 - y;
        }
        iterations += 1;
    }

    // Only reachable for inputs beyond the documented range
    (y.clamp(-1.0, 1.0), iterations)
}

/// Fold `x` with the gain selected by a smoothness setting in `[0.5, 1]`
#[inline]
pub fn wavefold(x: f64, smoothness: f64) -> f64 {
    let amount = (2.0 * (smoothness - 0.5)).clamp(0.0, 1.0);
    let gain = 1.0 + (MAX_FOLD_GAIN - 1.0) * amount;
    fold(x * gain).0
}

/// Lowpass coefficient for a smoothness setting in `[0, 0.5)`
#[inline]
pub fn lowpass_coefficient(smoothness: f64) -> f64 {
    let cutoff = (2.0 * smoothness).clamp(0.0, 1.0);
    0.01 + 0.49 * cutoff
}

/// Per-channel lowpass memory
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FilterState {
    channels: [f64; NUM_CHANNELS],
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: usize) -> f64 {
        self.channels.get(channel).copied().unwrap_or(0.0)
    }

    pub fn clear(&mut self) {
        self.channels = [0.0; NUM_CHANNELS];
    }

    /// Run one sample of a unipolar `x` in 0–1 through channel `channel`.
    ///
    /// Below the midpoint the channel's accumulator is updated and returned.
    /// At or above it the input is folded around its centre (`2x - 1`) and
    /// mapped back to 0–1, leaving the accumulator as is. Either way the
    /// result stays in 0–1.
    #[inline]
    pub fn process(&mut self, channel: usize, x: f64, smoothness: f64) -> f64 {
        let smoothness = smoothness.clamp(0.0, 1.0);
        if smoothness < 0.5 {
            let coeff = lowpass_coefficient(smoothness);
            let state = &mut self.channels[channel % NUM_CHANNELS];
            *state += coeff * (x - *state);
            *state
        } else {
            0.5 * (wavefold(2.0 * x - 1.0, smoothness) + 1.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_fold_inside_band_untouched() {
        assert_eq!(fold(0.25), (0.25, 0));
        assert_eq!(fold(-1.0), (-1.0, 0));
        assert_eq!(fold(1.0), (1.0, 0));
    }

    #[test]
    fn test_fold_reflections() {
        assert_relative_eq!(fold(1.5).0, 0.5);
        assert_relative_eq!(fold(-1.5).0, -0.5);
        assert_relative_eq!(fold(3.5).0, -0.5);
        assert_eq!(fold(3.5).1, 2);
    }

    #[test]
    fn test_wavefold_bounded() {
        // smoothness in [0.5, 1], inputs in [-4, 4]
        for s in 0..=50 {
            let smoothness = 0.5 + s as f64 / 100.0;
            let amount = 2.0 * (smoothness - 0.5);
            let gain = 1.0 + 3.0 * amount;
            for i in 0..=800 {
                let x = -4.0 + i as f64 / 100.0;
                let (y, iterations) = fold(x * gain);
                assert!((-1.0..=1.0).contains(&y), "fold({}) = {}", x * gain, y);
                assert!(iterations <= MAX_FOLD_ITERATIONS);
                assert_eq!(y, wavefold(x, smoothness));
            }
        }
    }

    #[test]
    fn test_fold_worst_case_iterations() {
        let (y, iterations) = fold(16.0);
        assert_eq!(iterations, 8);
        assert_relative_eq!(y, 0.0);
    }

    #[test]
    fn test_wavefold_midpoint_is_identity_in_band() {
        assert_relative_eq!(wavefold(0.7, 0.5), 0.7);
    }

    #[test]
    fn test_lowpass_coefficient_range() {
        assert_relative_eq!(lowpass_coefficient(0.0), 0.01);
        assert_relative_eq!(lowpass_coefficient(0.25), 0.255, epsilon = 1e-12);
        assert!(lowpass_coefficient(0.4999) < 0.5);
    }

    #[test]
    fn test_lowpass_converges() {
        let mut filter = FilterState::new();
        let mut y = 0.0;
        for _ in 0..2000 {
            y = filter.process(0, 1.0, 0.0);
        }
        assert_relative_eq!(y, 1.0, epsilon = 1e-6);
        assert_relative_eq!(filter.get(0), y);
    }

    #[test]
    fn test_lowpass_first_step() {
        let mut filter = FilterState::new();
        assert_relative_eq!(filter.process(2, 1.0, 0.0), 0.01);
    }

    #[test]
    fn test_channels_independent() {
        let mut filter = FilterState::new();
        for _ in 0..50 {
            filter.process(1, 1.0, 0.1);
        }
        assert!(filter.get(1) > 0.0);
        assert_eq!(filter.get(0), 0.0);
        assert_eq!(filter.get(2), 0.0);
        assert_eq!(filter.get(3), 0.0);
    }

    #[test]
    fn test_fold_leaves_memory_alone() {
        let mut filter = FilterState::new();
        filter.process(0, 1.0, 0.2);
        let before = filter.get(0);
        filter.process(0, 0.3, 0.9);
        assert_eq!(filter.get(0), before);
    }

    #[test]
    fn test_fold_keeps_unipolar_range() {
        let mut filter = FilterState::new();
        for s in 0..=10 {
            let smoothness = 0.5 + s as f64 / 20.0;
            for i in 0..=200 {
                let y = filter.process(0, i as f64 / 200.0, smoothness);
                assert!((0.0..=1.0).contains(&y), "{} at {}", y, smoothness);
            }
        }
    }

    #[test]
    fn test_fold_midpoint_passes_through() {
        let mut filter = FilterState::new();
        assert_relative_eq!(filter.process(0, 0.3, 0.5), 0.3, epsilon = 1e-12);
        assert_relative_eq!(filter.process(0, 1.0, 0.5), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_full_fold_reflects_both_ends() {
        let mut filter = FilterState::new();
        // Gain 4: the ends land at ±4, which fold back to the centre
        assert_relative_eq!(filter.process(0, 0.0, 1.0), 0.5, epsilon = 1e-12);
        assert_relative_eq!(filter.process(0, 1.0, 1.0), 0.5, epsilon = 1e-12);
        // 2 * 0.375 - 1 = -0.25, x4 = -1: exactly on the lower edge
        assert_relative_eq!(filter.process(0, 0.375, 1.0), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_clear() {
        let mut filter = FilterState::new();
        filter.process(3, 1.0, 0.3);
        filter.clear();
        assert_eq!(filter, FilterState::new());
    }
}
