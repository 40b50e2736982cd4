use crate::support::constraint::{Constrained, StrictlyPositive};

use super::Curve;

/// Tendon force-length curve with an exponential toe and a linear region.
///
/// The input is tendon length divided by tendon slack length.
/// The tendon is slack (zero force) at or below its slack length.
/// Past the toe strain the curve continues linearly with the toe's end slope,
/// so the curve is continuously differentiable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TendonForceLength {
    toe_strain: f64,
    toe_force: f64,
    toe_shape: f64,
    linear_stiffness: f64,
}

impl Default for TendonForceLength {
    fn default() -> Self {
        Self::with_strain(0.049)
    }
}

impl TendonForceLength {
    /// Creates a tendon curve that carries the max isometric force at the
    /// given strain.
    #[must_use]
    pub fn new(strain_at_one_norm_force: Constrained<f64, StrictlyPositive>) -> Self {
        Self::with_strain(strain_at_one_norm_force.into_inner())
    }

    fn with_strain(strain_at_one_norm_force: f64) -> Self {
        let toe_strain = 0.609 * strain_at_one_norm_force;
        let toe_force = 0.33;
        let toe_shape: f64 = 3.0;
        let linear_stiffness =
            toe_force * toe_shape * toe_shape.exp() / (toe_strain * toe_shape.exp_m1());
        Self {
            toe_strain,
            toe_force,
            toe_shape,
            linear_stiffness,
        }
    }
}

impl Curve for TendonForceLength {
    fn value(&self, x: f64) -> f64 {
        let strain = x - 1.0;
        if strain <= 0.0 {
            0.0
        } else if strain <= self.toe_strain {
            self.toe_force / self.toe_shape.exp_m1()
                * (self.toe_shape * strain / self.toe_strain).exp_m1()
        } else {
            self.toe_force + self.linear_stiffness * (strain - self.toe_strain)
        }
    }

    fn derivative(&self, x: f64) -> f64 {
        let strain = x - 1.0;
        if strain <= 0.0 {
            0.0
        } else if strain <= self.toe_strain {
            self.toe_force / self.toe_shape.exp_m1() * self.toe_shape / self.toe_strain
                * (self.toe_shape * strain / self.toe_strain).exp()
        } else {
            self.linear_stiffness
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::support::curve::assert_derivative_matches;

    #[test]
    fn slack_tendon_carries_no_force() {
        let curve = TendonForceLength::default();
        assert_relative_eq!(curve.value(0.98), 0.0);
        assert_relative_eq!(curve.value(1.0), 0.0);
        assert_relative_eq!(curve.derivative(0.99), 0.0);
    }

    #[test]
    fn carries_about_one_at_characteristic_strain() {
        let curve = TendonForceLength::default();
        assert_relative_eq!(curve.value(1.049), 1.0, epsilon = 2e-3);
    }

    #[test]
    fn slope_is_continuous_at_end_of_toe() {
        let curve = TendonForceLength::default();
        let x = 1.0 + curve.toe_strain;
        assert_relative_eq!(curve.derivative(x), curve.derivative(x + 1e-12), max_relative = 1e-9);
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let curve = TendonForceLength::default();
        for x in [1.01, 1.02, 1.04, 1.06] {
            assert_derivative_matches(&curve, x);
        }
    }
}
