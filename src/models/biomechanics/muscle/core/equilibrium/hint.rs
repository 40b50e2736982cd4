use uom::si::{
    f64::{Length, Velocity},
    length::meter,
    velocity::meter_per_second,
};

use super::FiberEquilibrium;

/// Warm start for the reduced-dynamics solve: the last converged fiber
/// length and velocity.
///
/// A hint is a cache, not physical state. It only influences how many
/// iterations a solve takes, never the value it converges to. It is owned by
/// the caller and passed alongside the state so it can be supplied
/// explicitly, reset, or discarded.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolverHint {
    last: Option<(f64, f64)>,
}

impl SolverHint {
    /// An empty hint. The next reduced solve seeds itself from an initial
    /// equilibrium.
    #[must_use]
    pub fn cold() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(fiber_length: Length, fiber_velocity: Velocity) -> Self {
        Self {
            last: Some((
                fiber_length.get::<meter>(),
                fiber_velocity.get::<meter_per_second>(),
            )),
        }
    }

    #[must_use]
    pub fn is_cold(&self) -> bool {
        self.last.is_none()
    }

    #[must_use]
    pub fn fiber_length(&self) -> Option<Length> {
        self.last.map(|(length, _)| Length::new::<meter>(length))
    }

    #[must_use]
    pub fn fiber_velocity(&self) -> Option<Velocity> {
        self.last
            .map(|(_, velocity)| Velocity::new::<meter_per_second>(velocity))
    }

    pub fn reset(&mut self) {
        self.last = None;
    }

    pub(crate) fn seed(&self) -> Option<(f64, f64)> {
        self.last
    }

    pub(crate) fn update(&mut self, equilibrium: &FiberEquilibrium) {
        self.last = Some((
            equilibrium.fiber_length.get::<meter>(),
            equilibrium.fiber_velocity.get::<meter_per_second>(),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use super::super::EquilibriumStatus;

    #[test]
    fn starts_cold_and_remembers_updates() {
        let mut hint = SolverHint::cold();
        assert!(hint.is_cold());
        assert_eq!(hint.fiber_length(), None);

        let equilibrium =
            FiberEquilibrium::new(0.09, -0.2, EquilibriumStatus::Converged, 1e-10, 4);
        hint.update(&equilibrium);
        assert!(!hint.is_cold());
        assert_relative_eq!(hint.fiber_length().unwrap().get::<meter>(), 0.09);
        assert_relative_eq!(
            hint.fiber_velocity().unwrap().get::<meter_per_second>(),
            -0.2
        );

        hint.reset();
        assert_eq!(hint, SolverHint::cold());
    }
}
