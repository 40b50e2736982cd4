use uom::si::{
    f64::{Angle, Force, Length, Velocity},
    force::newton,
    length::meter,
    velocity::meter_per_second,
};

use crate::support::constraint::{Constrained, NonNegative, StrictlyPositive};

/// Physical parameters of a musculotendon actuator.
///
/// Validity is enforced by the constrained constructor arguments, so a
/// parameter set that exists is always usable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuscleParameters {
    max_isometric_force: Force,
    optimal_fiber_length: Length,
    tendon_slack_length: Length,
    pennation_angle_at_optimal: Angle,
    max_contraction_velocity: f64,
}

impl MuscleParameters {
    /// Creates a parameter set with a max contraction velocity of 10 optimal
    /// fiber lengths per second.
    #[must_use]
    pub fn new(
        max_isometric_force: Constrained<Force, StrictlyPositive>,
        optimal_fiber_length: Constrained<Length, StrictlyPositive>,
        tendon_slack_length: Constrained<Length, StrictlyPositive>,
        pennation_angle_at_optimal: Constrained<Angle, NonNegative>,
    ) -> Self {
        Self {
            max_isometric_force: max_isometric_force.into_inner(),
            optimal_fiber_length: optimal_fiber_length.into_inner(),
            tendon_slack_length: tendon_slack_length.into_inner(),
            pennation_angle_at_optimal: pennation_angle_at_optimal.into_inner(),
            max_contraction_velocity: 10.0,
        }
    }

    /// Sets the max contraction velocity, in optimal fiber lengths per second.
    #[must_use]
    pub fn with_max_contraction_velocity(
        mut self,
        max_contraction_velocity: Constrained<f64, StrictlyPositive>,
    ) -> Self {
        self.max_contraction_velocity = max_contraction_velocity.into_inner();
        self
    }

    #[must_use]
    pub fn max_isometric_force(&self) -> Force {
        self.max_isometric_force
    }

    #[must_use]
    pub fn optimal_fiber_length(&self) -> Length {
        self.optimal_fiber_length
    }

    #[must_use]
    pub fn tendon_slack_length(&self) -> Length {
        self.tendon_slack_length
    }

    #[must_use]
    pub fn pennation_angle_at_optimal(&self) -> Angle {
        self.pennation_angle_at_optimal
    }

    /// Max contraction velocity, in optimal fiber lengths per second.
    #[must_use]
    pub fn max_contraction_velocity(&self) -> f64 {
        self.max_contraction_velocity
    }

    /// Max contraction velocity as a fiber speed.
    #[must_use]
    pub fn max_fiber_velocity(&self) -> Velocity {
        Velocity::new::<meter_per_second>(self.max_velocity())
    }

    pub(crate) fn fiso(&self) -> f64 {
        self.max_isometric_force.get::<newton>()
    }

    pub(crate) fn lopt(&self) -> f64 {
        self.optimal_fiber_length.get::<meter>()
    }

    pub(crate) fn lts(&self) -> f64 {
        self.tendon_slack_length.get::<meter>()
    }

    /// Max contraction velocity in m/s.
    pub(crate) fn max_velocity(&self) -> f64 {
        self.max_contraction_velocity * self.lopt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::angle::radian;

    #[test]
    fn converts_to_si() {
        let params = MuscleParameters::new(
            StrictlyPositive::new(Force::new::<newton>(1500.0)).unwrap(),
            StrictlyPositive::new(Length::new::<meter>(0.12)).unwrap(),
            StrictlyPositive::new(Length::new::<meter>(0.3)).unwrap(),
            NonNegative::new(Angle::new::<radian>(0.1)).unwrap(),
        )
        .with_max_contraction_velocity(StrictlyPositive::new(8.0).unwrap());

        assert_relative_eq!(params.fiso(), 1500.0);
        assert_relative_eq!(params.lts(), 0.3);
        assert_relative_eq!(params.max_velocity(), 0.96);
        assert_relative_eq!(params.max_fiber_velocity().get::<meter_per_second>(), 0.96);
    }
}
