use std::f64::consts::FRAC_PI_2;

use uom::si::{
    angle::radian,
    f64::{Angle, Length},
    length::meter,
};

use crate::support::constraint::{
    Constrained, ConstraintError, ConstraintResult, NonNegative, StrictlyPositive,
};

use super::{DomainError, PennationModel};

/// Fixed-width (constant volume, constant height) pennation geometry.
///
/// The fiber is the diagonal of a parallelogram whose height stays constant
/// as the fiber changes length:
///
/// ```text
/// h = l_opt · sin(φ_opt),   sin(φ) = h / l,   l_along_tendon = l · cos(φ)
/// ```
///
/// The fiber length floor is the length at which `φ` reaches the maximum
/// pennation angle, and never less than 1% of the optimal fiber length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedWidthPennation {
    optimal_fiber_length: f64,
    height: f64,
    maximum_pennation_angle: f64,
    minimum_fiber_length: f64,
}

impl FixedWidthPennation {
    /// Relative tolerance applied to the fiber length floor.
    const FLOOR_TOLERANCE: f64 = 1e-9;

    /// Creates a pennation model from the muscle's optimal fiber length and
    /// its pennation angle at that length.
    ///
    /// The maximum pennation angle defaults to `acos(0.1)` (about 84°).
    ///
    /// # Errors
    ///
    /// Returns an error if the optimal fiber length is not strictly positive or
    /// if the pennation angle is negative or not below 90°.
    pub fn new(
        optimal_fiber_length: Length,
        pennation_at_optimal: Angle,
    ) -> ConstraintResult<Self> {
        let l_opt = StrictlyPositive::new(optimal_fiber_length)?
            .into_inner()
            .get::<meter>();
        let phi_opt = NonNegative::new(pennation_at_optimal)?
            .into_inner()
            .get::<radian>();
        if phi_opt >= FRAC_PI_2 {
            return Err(ConstraintError::AboveMaximum);
        }

        let mut model = Self {
            optimal_fiber_length: l_opt,
            height: l_opt * phi_opt.sin(),
            maximum_pennation_angle: 0.1_f64.acos(),
            minimum_fiber_length: 0.0,
        };
        model.update_floor();
        Ok(model)
    }

    /// Sets the maximum pennation angle.
    ///
    /// # Errors
    ///
    /// See [`PennationModel::set_maximum_pennation_angle`].
    pub fn with_maximum_pennation_angle(
        mut self,
        angle: Constrained<Angle, StrictlyPositive>,
    ) -> ConstraintResult<Self> {
        self.set_maximum_pennation_angle(angle.into_inner().get::<radian>())?;
        Ok(self)
    }

    /// Constant height of the fiber parallelogram, in meters.
    #[must_use]
    pub fn parallelogram_height(&self) -> f64 {
        self.height
    }

    fn update_floor(&mut self) {
        let geometric = self.height / self.maximum_pennation_angle.sin();
        self.minimum_fiber_length = geometric.max(0.01 * self.optimal_fiber_length);
    }

    fn check(&self, fiber_length: f64) -> Result<(), DomainError> {
        if !fiber_length.is_finite() {
            return Err(DomainError::NonFinite {
                value: fiber_length,
            });
        }
        if fiber_length < self.minimum_fiber_length * (1.0 - Self::FLOOR_TOLERANCE) {
            return Err(DomainError::BelowMinimumFiberLength {
                fiber_length,
                minimum: self.minimum_fiber_length,
            });
        }
        Ok(())
    }
}

impl PennationModel for FixedWidthPennation {
    fn minimum_fiber_length(&self) -> f64 {
        self.minimum_fiber_length
    }

    fn maximum_pennation_angle(&self) -> f64 {
        self.maximum_pennation_angle
    }

    fn set_maximum_pennation_angle(&mut self, angle: f64) -> ConstraintResult<()> {
        let angle = StrictlyPositive::new(angle)?.into_inner();
        if angle > FRAC_PI_2 {
            return Err(ConstraintError::AboveMaximum);
        }
        if angle.sin() * self.optimal_fiber_length < self.height {
            return Err(ConstraintError::BelowMinimum);
        }
        self.maximum_pennation_angle = angle;
        self.update_floor();
        Ok(())
    }

    fn pennation_angle(&self, fiber_length: f64) -> Result<f64, DomainError> {
        self.check(fiber_length)?;
        Ok((self.height / fiber_length).min(1.0).asin())
    }

    fn pennation_angle_derivative(&self, fiber_length: f64) -> Result<f64, DomainError> {
        let phi = self.pennation_angle(fiber_length)?;
        Ok(-phi.tan() / fiber_length)
    }

    fn fiber_length(&self, length_along_tendon: f64) -> f64 {
        length_along_tendon.hypot(self.height)
    }

    fn fiber_length_along_tendon(&self, fiber_length: f64) -> Result<f64, DomainError> {
        self.check(fiber_length)?;
        Ok((fiber_length * fiber_length - self.height * self.height)
            .max(0.0)
            .sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn pennate() -> FixedWidthPennation {
        FixedWidthPennation::new(Length::new::<meter>(0.1), Angle::new::<radian>(0.3)).unwrap()
    }

    #[test]
    fn optimal_length_has_optimal_angle() {
        let model = pennate();
        assert_relative_eq!(model.pennation_angle(0.1).unwrap(), 0.3, epsilon = 1e-12);
        assert_relative_eq!(
            model.fiber_length_along_tendon(0.1).unwrap(),
            0.1 * 0.3_f64.cos(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn length_round_trip() {
        let model = pennate();
        let floor = model.minimum_fiber_length();
        for l in [floor, 0.05, 0.1, 0.17, 0.4] {
            let along = model.fiber_length_along_tendon(l).unwrap();
            assert_relative_eq!(model.fiber_length(along), l, max_relative = 1e-12);
        }
    }

    #[test]
    fn floor_is_at_maximum_angle() {
        let model = pennate();
        let floor = model.minimum_fiber_length();
        assert_relative_eq!(
            model.pennation_angle(floor).unwrap(),
            model.maximum_pennation_angle(),
            epsilon = 1e-9
        );
    }

    #[test]
    fn parallel_fibers_use_fractional_floor() {
        let model =
            FixedWidthPennation::new(Length::new::<meter>(0.1), Angle::new::<radian>(0.0)).unwrap();
        assert_relative_eq!(model.minimum_fiber_length(), 0.001);
        assert_relative_eq!(model.pennation_angle(0.05).unwrap(), 0.0);
    }

    #[test]
    fn refuses_lengths_below_floor() {
        let model = pennate();
        let floor = model.minimum_fiber_length();
        assert!(matches!(
            model.pennation_angle(0.9 * floor),
            Err(DomainError::BelowMinimumFiberLength { .. })
        ));
        assert!(matches!(
            model.velocity_projection(f64::NAN, 0.0),
            Err(DomainError::NonFinite { .. })
        ));
    }

    #[test]
    fn along_tendon_velocity_matches_finite_difference() {
        let model = pennate();
        let (l, v, dt) = (0.08, -0.3, 1e-7);
        let before = model.fiber_length_along_tendon(l).unwrap();
        let after = model.fiber_length_along_tendon(l + v * dt).unwrap();
        assert_relative_eq!(
            model.fiber_velocity_along_tendon(l, v).unwrap(),
            (after - before) / dt,
            max_relative = 1e-5
        );
    }

    #[test]
    fn angular_velocity_matches_finite_difference() {
        let model = pennate();
        let (l, v, dt) = (0.08, 0.2, 1e-7);
        let pennation = model.velocity_projection(l, v).unwrap();
        let after = model.pennation_angle(l + v * dt).unwrap();
        assert_relative_eq!(
            pennation.angular_velocity,
            (after - pennation.angle) / dt,
            max_relative = 1e-5
        );
    }

    #[test]
    fn rejects_invalid_ceiling() {
        let mut model = pennate();
        assert!(model.set_maximum_pennation_angle(2.0).is_err());
        assert!(model.set_maximum_pennation_angle(0.2).is_err());
        assert!(model.set_maximum_pennation_angle(FRAC_PI_2).is_ok());
        assert_relative_eq!(model.minimum_fiber_length(), model.parallelogram_height());
    }
}
