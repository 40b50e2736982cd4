use uom::si::f64::{Angle, AngularVelocity, Length, Velocity};

use super::{EquilibriumError, EquilibriumStatus};

/// Length and lengthening speed of the whole musculotendon path, as supplied
/// by the skeletal model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathKinematics {
    pub length: Length,
    pub lengthening_speed: Velocity,
}

/// Values the integrator carries for a muscle.
///
/// Which entries are present depends on the simulation mode. An absent entry
/// that the mode needs falls back to the muscle's default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StateVariables {
    pub activation: Option<f64>,
    pub fiber_length: Option<Length>,
}

/// The minimal fiber state from which everything else derives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuscleKinematicState {
    pub fiber_length: Length,
    pub fiber_velocity: Velocity,
    pub pennation_angle: Angle,
    pub pennation_angular_velocity: AngularVelocity,
    pub activation: f64,
    pub status: EquilibriumStatus,
}

/// A resolved state, plus the recoverable failure that produced it, if any.
///
/// A warning means the reduced-dynamics solve failed and the state was
/// rebuilt from the previous hint.
#[derive(Debug)]
pub struct ResolvedState {
    pub state: MuscleKinematicState,
    pub warning: Option<EquilibriumError>,
}
