//! Equilibrium musculotendon actuator models.
//!
//! [`EquilibriumMuscle`] carries the operations a multibody simulation needs
//! from a muscle. It also implements [`twine_core::Model`], mapping path
//! kinematics, state variables and excitation onto the resolved state, its
//! derived quantities and the state derivatives in a single call.
//!
//! # Example
//!
//! ```
//! use twine_core::Model;
//! use twine_muscle::models::biomechanics::muscle::{
//!     EquilibriumMuscle, MuscleConfiguration, MuscleInput, MuscleParameters, PathKinematics,
//!     SolverHint, StateVariables,
//! };
//! use twine_muscle::support::constraint::{NonNegative, StrictlyPositive};
//! use uom::si::{
//!     angle::radian,
//!     f64::{Angle, Force, Length, Velocity},
//!     force::newton,
//!     length::meter,
//!     velocity::meter_per_second,
//! };
//!
//! let parameters = MuscleParameters::new(
//!     StrictlyPositive::new(Force::new::<newton>(1000.0)).unwrap(),
//!     StrictlyPositive::new(Length::new::<meter>(0.1)).unwrap(),
//!     StrictlyPositive::new(Length::new::<meter>(0.2)).unwrap(),
//!     NonNegative::new(Angle::new::<radian>(0.0)).unwrap(),
//! );
//! let rigid = MuscleConfiguration {
//!     tendon_compliant: false,
//!     activation_dynamics: false,
//!     reduced_fiber_dynamics: false,
//! };
//! let muscle = EquilibriumMuscle::new("biceps", parameters, rigid).unwrap();
//!
//! let output = muscle
//!     .call(&MuscleInput {
//!         path: PathKinematics {
//!             length: Length::new::<meter>(0.3),
//!             lengthening_speed: Velocity::new::<meter_per_second>(0.0),
//!         },
//!         variables: StateVariables::default(),
//!         excitation: 1.0,
//!         activation_rate: 0.0,
//!         hint: SolverHint::cold(),
//!     })
//!     .unwrap();
//!
//! let force = output.dynamics.tendon_force.get::<newton>();
//! assert!((force - 1000.0).abs() < 1e-6);
//! ```

mod core;

pub use self::core::{
    ActivationMode, Bounds, ConfigurationError, EquilibriumConfig, EquilibriumError,
    EquilibriumMuscle, EquilibriumStatus, FiberDynamics, FiberEquilibrium, FiberVelocityInfo,
    MuscleConfiguration, MuscleDynamicsInfo, MuscleError, MuscleEvaluation, MuscleKinematicState,
    MuscleLengthInfo, MuscleParameters, PathKinematics, ResolvedState, SimulationMode,
    SolverHint, StateDerivatives, StateVariables, classify,
};

use twine_core::Model;

use crate::support::{
    activation::ActivationModel, curve::MuscleCurves, pennation::PennationModel,
};

/// Input to a single muscle evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuscleInput {
    pub path: PathKinematics,
    pub variables: StateVariables,
    pub excitation: f64,

    /// Only used when activation equals excitation.
    pub activation_rate: f64,

    /// Warm start for reduced fiber dynamics. Ignored by other modes.
    pub hint: SolverHint,
}

/// Everything a muscle evaluation produces.
#[derive(Debug)]
pub struct MuscleOutput {
    pub state: MuscleKinematicState,

    /// The hint to pass to the next evaluation.
    pub hint: SolverHint,

    pub length: MuscleLengthInfo,
    pub velocity: FiberVelocityInfo,
    pub dynamics: MuscleDynamicsInfo,
    pub derivatives: StateDerivatives,

    /// Recoverable solver failure, if the state was rebuilt from the hint.
    pub warning: Option<EquilibriumError>,
}

impl<C, P, A> Model for EquilibriumMuscle<C, P, A>
where
    C: MuscleCurves,
    P: PennationModel + Clone,
    A: ActivationModel + Clone,
{
    type Input = MuscleInput;
    type Output = MuscleOutput;
    type Error = MuscleError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let mut hint = input.hint;
        let resolved = self.resolve_state(
            &input.path,
            &input.variables,
            input.excitation,
            input.activation_rate,
            &mut hint,
        )?;
        let evaluation = self.evaluate(&input.path, &resolved.state)?;
        let derivatives = self.state_derivatives(&resolved.state, input.excitation);

        Ok(MuscleOutput {
            state: resolved.state,
            hint,
            length: evaluation.length,
            velocity: evaluation.velocity,
            dynamics: evaluation.dynamics,
            derivatives,
            warning: resolved.warning,
        })
    }
}
