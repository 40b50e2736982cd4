use crate::support::constraint::{
    Constrained, ConstraintError, ConstraintResult, StrictlyPositive, UnitInterval,
};

use super::ActivationModel;

/// First-order activation dynamics with activation-dependent time constants.
///
/// ```text
/// da/dt = (u - a) / τ
///
/// τ = τ_act · (0.5 + 1.5 a)     when u > a
/// τ = τ_deact / (0.5 + 1.5 a)   otherwise
/// ```
///
/// Both excitation and activation are clamped to `[a_min, 1]` before the rate
/// is formed, so activation can never be driven below the floor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FirstOrderActivation {
    activation_time_constant: f64,
    deactivation_time_constant: f64,
    minimum_activation: f64,
}

impl Default for FirstOrderActivation {
    fn default() -> Self {
        Self {
            activation_time_constant: 0.015,
            deactivation_time_constant: 0.060,
            minimum_activation: 0.01,
        }
    }
}

impl FirstOrderActivation {
    /// Creates activation dynamics with the given time constants, in seconds.
    #[must_use]
    pub fn new(
        activation_time_constant: Constrained<f64, StrictlyPositive>,
        deactivation_time_constant: Constrained<f64, StrictlyPositive>,
    ) -> Self {
        Self {
            activation_time_constant: activation_time_constant.into_inner(),
            deactivation_time_constant: deactivation_time_constant.into_inner(),
            ..Self::default()
        }
    }

    /// Sets the lower bound on activation.
    ///
    /// # Errors
    ///
    /// Returns [`ConstraintError::AboveMaximum`] if the floor is 1, which would
    /// leave no room for activation to change.
    pub fn with_minimum_activation(
        mut self,
        minimum: Constrained<f64, UnitInterval>,
    ) -> ConstraintResult<Self> {
        self.set_minimum_activation(minimum)?;
        Ok(self)
    }

    fn time_constant(&self, excitation: f64, activation: f64) -> f64 {
        let scale = 0.5 + 1.5 * activation;
        if excitation > activation {
            self.activation_time_constant * scale
        } else {
            self.deactivation_time_constant / scale
        }
    }
}

impl ActivationModel for FirstOrderActivation {
    fn rate(&self, excitation: f64, activation: f64) -> f64 {
        let u = self.clamp_activation(excitation);
        let a = self.clamp_activation(activation);
        (u - a) / self.time_constant(u, a)
    }

    fn minimum_activation(&self) -> f64 {
        self.minimum_activation
    }

    fn set_minimum_activation(
        &mut self,
        minimum: Constrained<f64, UnitInterval>,
    ) -> ConstraintResult<()> {
        let minimum = minimum.into_inner();
        if minimum >= 1.0 {
            return Err(ConstraintError::AboveMaximum);
        }
        self.minimum_activation = minimum;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn activates_faster_than_it_deactivates() {
        let dynamics = FirstOrderActivation::default();
        let rising = dynamics.rate(0.6, 0.5);
        let falling = dynamics.rate(0.4, 0.5);
        assert!(rising > 0.0);
        assert!(falling < 0.0);
        assert!(rising.abs() > falling.abs());
    }

    #[test]
    fn rate_matches_closed_form() {
        let dynamics = FirstOrderActivation::default();
        assert_relative_eq!(dynamics.rate(1.0, 0.2), 0.8 / (0.015 * 0.8));
        assert_relative_eq!(dynamics.rate(0.0, 0.2), (0.01 - 0.2) / (0.060 / 0.8));
    }

    #[test]
    fn steady_at_equal_excitation() {
        let dynamics = FirstOrderActivation::default();
        assert_relative_eq!(dynamics.rate(0.3, 0.3), 0.0);
    }

    #[test]
    fn never_drives_below_floor() {
        let dynamics = FirstOrderActivation::default();
        assert_relative_eq!(dynamics.rate(0.0, 0.01), 0.0);
        assert_relative_eq!(dynamics.clamp_activation(-0.5), 0.01);
        assert_relative_eq!(dynamics.clamp_activation(1.5), 1.0);
    }

    #[test]
    fn floor_can_be_changed() {
        let dynamics = FirstOrderActivation::default()
            .with_minimum_activation(UnitInterval::zero())
            .unwrap();
        assert_relative_eq!(dynamics.minimum_activation(), 0.0);

        let full = UnitInterval::new(1.0).unwrap();
        assert_eq!(
            FirstOrderActivation::default().with_minimum_activation(full),
            Err(ConstraintError::AboveMaximum)
        );
    }

    #[test]
    fn custom_time_constants() {
        let dynamics = FirstOrderActivation::new(
            StrictlyPositive::new(0.01).unwrap(),
            StrictlyPositive::new(0.04).unwrap(),
        );
        assert_relative_eq!(dynamics.rate(1.0, 0.0), 0.99 / (0.01 * 0.515));
    }
}
