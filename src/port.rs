//! Signal conventions and CV-modulated parameters
//!
//! Inputs arrive in normalized units where 1.0 corresponds to 5 V; outputs
//! are emitted in volts following hardware modular conventions.

use serde::{Deserialize, Serialize};

/// Volts represented by one unit of input CV
pub const VOLTS_PER_UNIT: f64 = 5.0;

/// Parameter change per volt of CV at full attenuverter
pub const PARAM_PER_VOLT: f64 = 0.1;

/// Output level of a high gate
pub const GATE_HIGH: f64 = 5.0;

/// Semantic classification of an output channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignalKind {
    /// Bipolar control voltage, ±5V (free-running ramps)
    CvBipolar,

    /// Unipolar control voltage, 0–8V (envelopes)
    CvUnipolar,

    /// Gate signal, binary state: 0V (low) or +5V (high)
    Gate,
}

impl SignalKind {
    /// Returns the voltage range (min, max) for this signal type
    pub fn voltage_range(&self) -> (f64, f64) {
        match self {
            SignalKind::CvBipolar => (-5.0, 5.0),
            SignalKind::CvUnipolar => (0.0, 8.0),
            SignalKind::Gate => (0.0, GATE_HIGH),
        }
    }

    /// Map a normalized 0–1 signal onto this kind's voltage range
    #[inline]
    pub fn scale(&self, normalized: f64) -> f64 {
        let (min, max) = self.voltage_range();
        min + normalized * (max - min)
    }

    /// Clamp a voltage into this kind's range
    #[inline]
    pub fn clamp(&self, volts: f64) -> f64 {
        let (min, max) = self.voltage_range();
        volts.clamp(min, max)
    }

    pub fn gate(high: bool) -> f64 {
        if high {
            GATE_HIGH
        } else {
            0.0
        }
    }
}

/// A parameter that combines a base value (knob) with optional CV modulation
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModulatedParam {
    /// Base value from panel knob (0.0–1.0 normalized)
    pub base: f64,

    /// Attenuverter setting (-1.0 to 1.0)
    /// Positive: CV adds to base
    /// Negative: CV subtracts from base (inverted)
    pub attenuverter: f64,

    /// Incoming CV in units; `None` when nothing is patched
    pub cv: Option<f64>,
}

impl ModulatedParam {
    pub fn new(base: f64, attenuverter: f64) -> Self {
        Self {
            base,
            attenuverter,
            cv: None,
        }
    }

    /// Update CV for this sample. Non-finite readings count as unpatched.
    pub fn set_cv(&mut self, cv: Option<f64>) {
        self.cv = cv.filter(|v| v.is_finite());
    }

    pub fn with_cv(mut self, cv: Option<f64>) -> Self {
        self.set_cv(cv);
        self
    }

    /// Effective value, clamped to 0–1.
    ///
    /// An absent CV leaves the knob value untouched.
    pub fn value(&self) -> f64 {
        let base = if self.base.is_finite() { self.base } else { 0.5 };
        let atten = if self.attenuverter.is_finite() {
            self.attenuverter.clamp(-1.0, 1.0)
        } else {
            0.0
        };
        let modulated = match self.cv {
            Some(cv) => base + cv * VOLTS_PER_UNIT * PARAM_PER_VOLT * atten,
            None => base,
        };
        modulated.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_kind_ranges() {
        assert_eq!(SignalKind::CvBipolar.voltage_range(), (-5.0, 5.0));
        assert_eq!(SignalKind::CvUnipolar.voltage_range(), (0.0, 8.0));
        assert_eq!(SignalKind::Gate.voltage_range(), (0.0, 5.0));
    }

    #[test]
    fn test_signal_kind_scale() {
        assert!((SignalKind::CvBipolar.scale(0.0) + 5.0).abs() < 1e-12);
        assert!((SignalKind::CvBipolar.scale(0.5)).abs() < 1e-12);
        assert!((SignalKind::CvUnipolar.scale(1.0) - 8.0).abs() < 1e-12);
        assert!((SignalKind::CvUnipolar.clamp(-3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_gate_levels() {
        assert_eq!(SignalKind::gate(true), GATE_HIGH);
        assert_eq!(SignalKind::gate(false), 0.0);
    }

    #[test]
    fn test_modulated_param() {
        let mut param = ModulatedParam::new(0.5, 1.0);

        // No CV: knob value passes through
        assert!((param.value() - 0.5).abs() < 1e-10);

        // One unit (5V) moves the parameter by 0.5 at full attenuverter
        param.set_cv(Some(0.2));
        assert!((param.value() - 0.6).abs() < 1e-10);

        // Invert attenuverter
        param.attenuverter = -1.0;
        assert!((param.value() - 0.4).abs() < 1e-10);
    }

    #[test]
    fn test_modulated_param_absent_cv_is_noop() {
        let param = ModulatedParam::new(0.3, -0.7).with_cv(None);
        assert!((param.value() - 0.3).abs() < 1e-12);

        let zero_atten = ModulatedParam::new(0.3, 0.0).with_cv(Some(1.0));
        assert!((zero_atten.value() - 0.3).abs() < 1e-12);
    }

    #[test]
    fn test_modulated_param_clamped() {
        let param = ModulatedParam::new(0.9, 1.0).with_cv(Some(4.0));
        assert!((param.value() - 1.0).abs() < 1e-12);

        let param = ModulatedParam::new(0.1, 1.0).with_cv(Some(-4.0));
        assert!(param.value().abs() < 1e-12);
    }

    #[test]
    fn test_modulated_param_non_finite_cv() {
        let param = ModulatedParam::new(0.4, 1.0).with_cv(Some(f64::NAN));
        assert_eq!(param.cv, None);
        assert!((param.value() - 0.4).abs() < 1e-12);
    }
}
