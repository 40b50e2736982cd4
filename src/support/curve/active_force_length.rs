use crate::support::constraint::{Constrained, StrictlyPositive, UnitInterval};

use super::{ActiveForceLengthCurve, Curve};

/// Asymmetric bell-shaped active force-length curve.
///
/// The curve peaks at 1 when the normalized fiber length is 1 and falls off
/// with separate widths on the ascending (short) and descending (long) limbs:
///
/// ```text
/// f(l) = m + (1 - m) · exp(-((l - 1) / w)²)
/// ```
///
/// The floor `m` keeps the curve strictly positive, which full fiber
/// dynamics with an elastic tendon requires.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveForceLength {
    width_ascending: f64,
    width_descending: f64,
    minimum_active_fiber_length: f64,
    minimum_value: f64,
}

impl Default for ActiveForceLength {
    fn default() -> Self {
        Self {
            width_ascending: 0.45,
            width_descending: 0.56,
            minimum_active_fiber_length: 0.5,
            minimum_value: 0.1,
        }
    }
}

impl ActiveForceLength {
    /// Creates a curve with custom limb widths and the default floor.
    #[must_use]
    pub fn new(
        width_ascending: Constrained<f64, StrictlyPositive>,
        width_descending: Constrained<f64, StrictlyPositive>,
    ) -> Self {
        Self {
            width_ascending: width_ascending.into_inner(),
            width_descending: width_descending.into_inner(),
            ..Self::default()
        }
    }

    /// Sets the smallest value the curve can take.
    #[must_use]
    pub fn with_minimum_value(mut self, minimum_value: Constrained<f64, UnitInterval>) -> Self {
        self.minimum_value = minimum_value.into_inner();
        self
    }

    /// Sets the shortest normalized fiber length the fiber may reach.
    #[must_use]
    pub fn with_minimum_active_fiber_length(
        mut self,
        length: Constrained<f64, StrictlyPositive>,
    ) -> Self {
        self.minimum_active_fiber_length = length.into_inner();
        self
    }

    fn width(&self, normalized_length: f64) -> f64 {
        if normalized_length < 1.0 {
            self.width_ascending
        } else {
            self.width_descending
        }
    }

    fn bell(&self, normalized_length: f64) -> f64 {
        let w = self.width(normalized_length);
        (-((normalized_length - 1.0) / w).powi(2)).exp()
    }
}

impl Curve for ActiveForceLength {
    fn value(&self, x: f64) -> f64 {
        self.minimum_value + (1.0 - self.minimum_value) * self.bell(x)
    }

    fn derivative(&self, x: f64) -> f64 {
        let w = self.width(x);
        (1.0 - self.minimum_value) * self.bell(x) * (-2.0 * (x - 1.0) / (w * w))
    }
}

impl ActiveForceLengthCurve for ActiveForceLength {
    fn minimum_active_fiber_length(&self) -> f64 {
        self.minimum_active_fiber_length
    }

    fn minimum_value(&self) -> f64 {
        self.minimum_value
    }
}
