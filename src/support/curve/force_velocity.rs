use crate::support::constraint::{ConstraintError, ConstraintResult, StrictlyPositive};

use super::{Curve, ForceVelocityCurve};

/// Invertible Hill force-velocity curve.
///
/// The normalized velocity `v` is fiber velocity divided by the maximum
/// contraction velocity, negative while shortening.
///
/// - Shortening, `-1 ≤ v < 0`: Hill hyperbola `(1 + v) / (1 - v / k)`.
/// - Lengthening, `0 ≤ v ≤ 1`: hyperbola rising from 1 to the eccentric
///   force maximum, with its curvature chosen so the slope is continuous at 0.
/// - Beyond `±1`: linear extensions matching the end slopes.
///
/// The result is strictly increasing over the whole real line, so
/// [`ForceVelocityCurve::inverse`] is closed form and total.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceVelocity {
    concentric_curvature: f64,
    eccentric_force_max: f64,
    eccentric_curvature: f64,
    eccentric_gain: f64,
}

impl Default for ForceVelocity {
    fn default() -> Self {
        Self::build(0.25, 1.4)
    }
}

impl ForceVelocity {
    /// Creates a force-velocity curve.
    ///
    /// # Errors
    ///
    /// Returns an error if the curvature is not strictly positive, or if the
    /// eccentric force maximum is not above 1 or is too large for a slope
    /// continuous at isometric.
    pub fn new(concentric_curvature: f64, eccentric_force_max: f64) -> ConstraintResult<Self> {
        let k = StrictlyPositive::new(concentric_curvature)?.into_inner();
        let rise = StrictlyPositive::new(eccentric_force_max - 1.0)
            .map_err(|_| ConstraintError::BelowMinimum)?
            .into_inner();

        if rise >= (k + 1.0) / k {
            return Err(ConstraintError::AboveMaximum);
        }

        Ok(Self::build(k, eccentric_force_max))
    }

    fn build(k: f64, eccentric_force_max: f64) -> Self {
        let rise = eccentric_force_max - 1.0;
        let c = rise / ((k + 1.0) / k - rise);
        Self {
            concentric_curvature: k,
            eccentric_force_max,
            eccentric_curvature: c,
            eccentric_gain: rise * (1.0 + c),
        }
    }

    /// Force multiplier reached at the maximum lengthening velocity.
    #[must_use]
    pub fn eccentric_force_max(&self) -> f64 {
        self.eccentric_force_max
    }

    fn concentric_slope_at_max_velocity(&self) -> f64 {
        let k = self.concentric_curvature;
        k / (k + 1.0)
    }

    fn eccentric_slope_at_max_velocity(&self) -> f64 {
        let c = self.eccentric_curvature;
        self.eccentric_gain * c / ((1.0 + c) * (1.0 + c))
    }
}

impl Curve for ForceVelocity {
    fn value(&self, v: f64) -> f64 {
        let k = self.concentric_curvature;
        let c = self.eccentric_curvature;
        if v < -1.0 {
            self.concentric_slope_at_max_velocity() * (v + 1.0)
        } else if v < 0.0 {
            (1.0 + v) / (1.0 - v / k)
        } else if v <= 1.0 {
            1.0 + self.eccentric_gain * v / (v + c)
        } else {
            self.eccentric_force_max + self.eccentric_slope_at_max_velocity() * (v - 1.0)
        }
    }

    fn derivative(&self, v: f64) -> f64 {
        let k = self.concentric_curvature;
        let c = self.eccentric_curvature;
        if v < -1.0 {
            self.concentric_slope_at_max_velocity()
        } else if v < 0.0 {
            let d = 1.0 - v / k;
            (1.0 + 1.0 / k) / (d * d)
        } else if v <= 1.0 {
            self.eccentric_gain * c / ((v + c) * (v + c))
        } else {
            self.eccentric_slope_at_max_velocity()
        }
    }
}

impl ForceVelocityCurve for ForceVelocity {
    fn inverse(&self, f: f64) -> f64 {
        let k = self.concentric_curvature;
        let c = self.eccentric_curvature;
        if f < 0.0 {
            f / self.concentric_slope_at_max_velocity() - 1.0
        } else if f < 1.0 {
            (f - 1.0) / (1.0 + f / k)
        } else if f <= self.eccentric_force_max {
            c * (f - 1.0) / (self.eccentric_gain - (f - 1.0))
        } else {
            1.0 + (f - self.eccentric_force_max) / self.eccentric_slope_at_max_velocity()
        }
    }
}
