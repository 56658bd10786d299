//! Per-sample processing seam
//!
//! Every stateful stage of the generator (smoother, edge detector, clock
//! tracker and the generator itself) is a [`Module`]: a stateful processor
//! that turns one input sample into one output sample and can be reset or
//! retuned to a new sample rate.

/// A signal processing module with typed input and output.
///
/// The `tick` method computes one step of the transformation, potentially
/// updating internal state (phase, filter memory, edge history).
///
/// # Implementing Module
///
/// ```rust
/// use ebb::Module;
///
/// struct Hold { value: f64 }
///
/// impl Module for Hold {
///     type In = Option<f64>;
///     type Out = f64;
///
///     fn tick(&mut self, input: Option<f64>) -> f64 {
///         if let Some(v) = input {
///             self.value = v;
///         }
///         self.value
///     }
///
///     fn reset(&mut self) {
///         self.value = 0.0;
///     }
/// }
/// ```
pub trait Module: Send {
    /// Input signal type
    type In;
    /// Output signal type
    type Out;

    /// Process a single sample, advancing internal state by one time step.
    fn tick(&mut self, input: Self::In) -> Self::Out;

    /// Process a block of samples.
    ///
    /// The default implementation calls `tick` in a loop over the shorter of
    /// the two slices.
    fn process(&mut self, input: &[Self::In], output: &mut [Self::Out])
    where
        Self::In: Clone,
    {
        for (i, o) in input.iter().zip(output.iter_mut()) {
            *o = self.tick(i.clone());
        }
    }

    /// Reset internal state to initial conditions.
    fn reset(&mut self);

    /// Notify module of sample rate changes.
    ///
    /// Modules with time-dependent behavior should recalculate coefficients here.
    fn set_sample_rate(&mut self, _sample_rate: f64) {}
}
