use uom::si::{f64::Velocity, velocity::meter_per_second};

use super::SimulationMode;

const ACTIVATION: &str = "activation";
const FIBER_LENGTH: &str = "fiber_length";

/// Right-hand side handed to the integrator.
///
/// Entries the mode does not integrate are `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateDerivatives {
    /// Activation rate, in 1/s.
    pub activation: Option<f64>,

    /// Fiber length rate.
    pub fiber_length: Option<Velocity>,
}

impl StateDerivatives {
    /// Present entries as SI scalars, ordered `[activation, fiber_length]`.
    #[must_use]
    pub fn as_vec(&self) -> Vec<f64> {
        self.activation
            .into_iter()
            .chain(self.fiber_length.map(|rate| rate.get::<meter_per_second>()))
            .collect()
    }
}

/// Names of the state variables a mode integrates, in derivative order.
pub(super) fn state_variable_names(mode: SimulationMode) -> Vec<&'static str> {
    let mut names = Vec::with_capacity(2);
    if mode.has_activation_state() {
        names.push(ACTIVATION);
    }
    if mode.has_fiber_length_state() {
        names.push(FIBER_LENGTH);
    }
    names
}
