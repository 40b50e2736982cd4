//! Activation dynamics: the lag between neural excitation and muscle activation.
//!
//! An [`ActivationModel`] supplies the activation rate for a given excitation
//! and current activation, together with a strictly enforced lower bound on
//! activation. Equilibrium muscles with an elastic tendon divide by
//! activation, so the floor is what keeps them finite as excitation drops.

mod first_order;

pub use first_order::FirstOrderActivation;

use crate::support::constraint::{Constrained, ConstraintResult, UnitInterval};

/// Activation dynamics capability.
pub trait ActivationModel {
    /// Time derivative of activation, in 1/s.
    fn rate(&self, excitation: f64, activation: f64) -> f64;

    /// Lower bound on activation.
    fn minimum_activation(&self) -> f64;

    /// Sets the lower bound on activation.
    ///
    /// # Errors
    ///
    /// Returns an error if the implementation cannot honor the requested floor.
    fn set_minimum_activation(
        &mut self,
        minimum: Constrained<f64, UnitInterval>,
    ) -> ConstraintResult<()>;

    /// Clamps `activation` to `[minimum_activation, 1]`.
    fn clamp_activation(&self, activation: f64) -> f64 {
        activation.clamp(self.minimum_activation(), 1.0)
    }
}
