use crate::support::constraint::{Constrained, StrictlyPositive};

use super::Curve;

/// Exponential passive fiber force-length curve.
///
/// Zero up to optimal fiber length, then rising exponentially so that the
/// passive force equals the max isometric force at `1 + strain_at_one_norm_force`:
///
/// ```text
/// f(l) = (exp(k · (l - 1) / e0) - 1) / (exp(k) - 1)    for l > 1
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiberForceLength {
    strain_at_one_norm_force: f64,
    shape_factor: f64,
}

impl Default for FiberForceLength {
    fn default() -> Self {
        Self {
            strain_at_one_norm_force: 0.6,
            shape_factor: 4.0,
        }
    }
}

impl FiberForceLength {
    #[must_use]
    pub fn new(
        strain_at_one_norm_force: Constrained<f64, StrictlyPositive>,
        shape_factor: Constrained<f64, StrictlyPositive>,
    ) -> Self {
        Self {
            strain_at_one_norm_force: strain_at_one_norm_force.into_inner(),
            shape_factor: shape_factor.into_inner(),
        }
    }

    fn scale(&self) -> f64 {
        1.0 / self.shape_factor.exp_m1()
    }

    fn rate(&self) -> f64 {
        self.shape_factor / self.strain_at_one_norm_force
    }
}

impl Curve for FiberForceLength {
    fn value(&self, x: f64) -> f64 {
        if x <= 1.0 {
            return 0.0;
        }
        self.scale() * (self.rate() * (x - 1.0)).exp_m1()
    }

    fn derivative(&self, x: f64) -> f64 {
        if x <= 1.0 {
            return 0.0;
        }
        self.scale() * self.rate() * (self.rate() * (x - 1.0)).exp()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::support::curve::assert_derivative_matches;

    #[test]
    fn slack_below_optimal_length() {
        let curve = FiberForceLength::default();
        assert_relative_eq!(curve.value(0.7), 0.0);
        assert_relative_eq!(curve.value(1.0), 0.0);
        assert_relative_eq!(curve.derivative(0.9), 0.0);
    }

    #[test]
    fn reaches_one_at_characteristic_strain() {
        let curve = FiberForceLength::default();
        assert_relative_eq!(curve.value(1.6), 1.0, epsilon = 1e-12);
        assert!(curve.value(1.3) < curve.value(1.4));
    }

    #[test]
    fn derivative_matches_finite_difference() {
        let curve = FiberForceLength::default();
        for x in [1.05, 1.3, 1.7] {
            assert_derivative_matches(&curve, x);
        }
    }
}
