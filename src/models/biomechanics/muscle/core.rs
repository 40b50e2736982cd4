//! Equilibrium musculotendon actuator.
//!
//! An equilibrium muscle resolves fiber length and velocity so that fiber
//! force projected onto the tendon equals tendon force, then derives every
//! kinematic and dynamic quantity the simulation consumes from that state.
//!
//! Three switches select the [`SimulationMode`]: tendon compliance,
//! activation dynamics and reduced fiber dynamics. The mode fixes which
//! state variables the integrator carries and which solver runs on each
//! evaluation:
//!
//! | Fiber dynamics   | Fiber length             | Fiber velocity                        |
//! |------------------|--------------------------|---------------------------------------|
//! | `Rigid`          | closed form from path    | closed form from path                 |
//! | `ElasticFull`    | integrated state         | inverted force-velocity relation      |
//! | `ElasticReduced` | per-evaluation Newton    | per-evaluation Newton, warm started   |

mod bounds;
mod config;
mod derivatives;
mod equilibrium;
mod error;
mod evaluate;
mod mechanics;
mod parameters;
mod state;

#[cfg(test)]
mod test_support;

pub use bounds::Bounds;
pub use config::{
    ActivationMode, ConfigurationError, FiberDynamics, MuscleConfiguration, SimulationMode,
    classify,
};
pub use derivatives::StateDerivatives;
pub use equilibrium::{
    EquilibriumConfig, EquilibriumError, EquilibriumStatus, FiberEquilibrium, SolverHint,
};
pub use error::MuscleError;
pub use evaluate::{FiberVelocityInfo, MuscleDynamicsInfo, MuscleEvaluation, MuscleLengthInfo};
pub use parameters::MuscleParameters;
pub use state::{MuscleKinematicState, PathKinematics, ResolvedState, StateVariables};

use tracing::{debug, warn};
use uom::si::{
    angle::radian,
    angular_velocity::radian_per_second,
    f64::{Angle, AngularVelocity, Force, Length, Velocity},
    force::newton,
    length::meter,
    velocity::meter_per_second,
};

use crate::support::{
    activation::{ActivationModel, FirstOrderActivation},
    constraint::{Constrained, StrictlyPositive, UnitInterval},
    curve::{CurveSet, MuscleCurves},
    pennation::{FixedWidthPennation, PennationModel},
};

use equilibrium::{
    EquilibriumInputs, elastic_initial_equilibrium, estimate_elastic_tendon_fiber_state,
    rigid_equilibrium,
};
use mechanics::Musculotendon;

/// A Hill-type musculotendon actuator kept in force equilibrium.
///
/// The muscle is generic over its collaborators: the characteristic curves
/// `C`, the pennation geometry `P` and the activation dynamics `A`. The
/// defaults are the reference implementations in [`crate::support`].
///
/// Every property edit recomputes the cached [`Bounds`]. Configuration
/// switches may only change until [`finalize`](Self::finalize) is called.
#[derive(Debug, Clone)]
pub struct EquilibriumMuscle<C = CurveSet, P = FixedWidthPennation, A = FirstOrderActivation> {
    name: String,
    parameters: MuscleParameters,
    curves: C,
    pennation: P,
    activation: A,
    configuration: MuscleConfiguration,
    mode: SimulationMode,
    bounds: Bounds,
    finalized: bool,
    default_activation: f64,
    default_fiber_length: f64,
    initial_config: EquilibriumConfig,
    reduced_config: EquilibriumConfig,
}

impl EquilibriumMuscle {
    /// Creates a muscle with the reference curves, fixed-width pennation and
    /// first-order activation dynamics.
    ///
    /// # Errors
    ///
    /// Returns a [`MuscleError`] if the pennation angle at optimal fiber
    /// length is not below 90° or the configuration is invalid.
    pub fn new(
        name: impl Into<String>,
        parameters: MuscleParameters,
        configuration: MuscleConfiguration,
    ) -> Result<Self, MuscleError> {
        let name = name.into();
        let pennation = FixedWidthPennation::new(
            parameters.optimal_fiber_length(),
            parameters.pennation_angle_at_optimal(),
        )
        .map_err(|source| MuscleError::parameter(&name, source))?;

        Self::with_collaborators(
            name,
            parameters,
            configuration,
            <CurveSet>::default(),
            pennation,
            FirstOrderActivation::default(),
        )
    }
}

impl<C, P, A> EquilibriumMuscle<C, P, A>
where
    C: MuscleCurves,
    P: PennationModel + Clone,
    A: ActivationModel + Clone,
{
    /// Creates a muscle from explicit collaborators.
    ///
    /// # Errors
    ///
    /// Returns a [`MuscleError`] if the configuration is invalid or the
    /// collaborators are singular for the resulting mode.
    pub fn with_collaborators(
        name: impl Into<String>,
        parameters: MuscleParameters,
        configuration: MuscleConfiguration,
        curves: C,
        pennation: P,
        activation: A,
    ) -> Result<Self, MuscleError> {
        let name = name.into();
        let mode = configuration
            .classify()
            .map_err(|source| MuscleError::configuration(&name, source))?;
        let bounds = Bounds::compute(mode, &parameters, &curves, &pennation, &activation)
            .map_err(|source| MuscleError::configuration(&name, source))?;

        Ok(Self {
            default_fiber_length: parameters.lopt(),
            name,
            parameters,
            curves,
            pennation,
            activation,
            configuration,
            mode,
            bounds,
            finalized: false,
            default_activation: 0.05,
            initial_config: EquilibriumConfig::default(),
            reduced_config: EquilibriumConfig::reduced(),
        })
    }

    /// Sets the convergence settings for initial equilibrium solves.
    #[must_use]
    pub fn with_initial_equilibrium_config(mut self, config: EquilibriumConfig) -> Self {
        self.initial_config = config;
        self
    }

    /// Sets the convergence settings for per-evaluation reduced solves.
    #[must_use]
    pub fn with_reduced_equilibrium_config(mut self, config: EquilibriumConfig) -> Self {
        self.reduced_config = config;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parameters(&self) -> &MuscleParameters {
        &self.parameters
    }

    #[must_use]
    pub fn curves(&self) -> &C {
        &self.curves
    }

    #[must_use]
    pub fn pennation(&self) -> &P {
        &self.pennation
    }

    #[must_use]
    pub fn activation_model(&self) -> &A {
        &self.activation
    }

    #[must_use]
    pub fn configuration(&self) -> MuscleConfiguration {
        self.configuration
    }

    #[must_use]
    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    #[must_use]
    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Activation used to seed the state at the start of a run.
    #[must_use]
    pub fn default_activation(&self) -> f64 {
        self.default_activation
    }

    /// Fiber length used to seed the state at the start of a run.
    #[must_use]
    pub fn default_fiber_length(&self) -> Length {
        Length::new::<meter>(self.default_fiber_length)
    }

    pub fn set_default_activation(&mut self, activation: Constrained<f64, UnitInterval>) {
        self.default_activation = activation.into_inner();
    }

    pub fn set_default_fiber_length(&mut self, fiber_length: Constrained<Length, StrictlyPositive>) {
        self.default_fiber_length = fiber_length.into_inner().get::<meter>();
    }

    /// Locks the configuration switches.
    ///
    /// Called once the enclosing system has allocated state for this muscle.
    pub fn finalize(&mut self) {
        self.finalized = true;
    }

    /// Replaces the configuration switches.
    ///
    /// # Errors
    ///
    /// Fails after [`finalize`](Self::finalize), on an invalid combination, or
    /// if the current collaborators are singular for the new mode.
    pub fn set_configuration(
        &mut self,
        configuration: MuscleConfiguration,
    ) -> Result<(), MuscleError> {
        if self.finalized {
            return Err(MuscleError::configuration(
                &self.name,
                ConfigurationError::Finalized,
            ));
        }
        let mode = configuration
            .classify()
            .map_err(|source| MuscleError::configuration(&self.name, source))?;
        self.bounds = self.compute_bounds(mode, &self.curves, &self.pennation, &self.activation)?;
        self.configuration = configuration;
        self.mode = mode;
        Ok(())
    }

    /// Replaces the characteristic curves.
    ///
    /// # Errors
    ///
    /// Fails if the curves are singular for the current mode.
    pub fn set_curves(&mut self, curves: C) -> Result<(), MuscleError> {
        self.bounds = self.compute_bounds(self.mode, &curves, &self.pennation, &self.activation)?;
        self.curves = curves;
        Ok(())
    }

    /// Sets the ceiling on the pennation angle.
    ///
    /// # Errors
    ///
    /// Fails if the geometry rejects the angle or the angle is not below 90°
    /// with elastic full fiber dynamics.
    pub fn set_maximum_pennation_angle(&mut self, angle: Angle) -> Result<(), MuscleError> {
        let mut pennation = self.pennation.clone();
        pennation
            .set_maximum_pennation_angle(angle.get::<radian>())
            .map_err(|source| MuscleError::parameter(&self.name, source))?;
        self.bounds = self.compute_bounds(self.mode, &self.curves, &pennation, &self.activation)?;
        self.pennation = pennation;
        Ok(())
    }

    /// Sets the lower bound on activation.
    ///
    /// # Errors
    ///
    /// Fails if the activation model rejects the floor or a zero floor is
    /// requested with elastic full fiber dynamics.
    pub fn set_minimum_activation(
        &mut self,
        minimum: Constrained<f64, UnitInterval>,
    ) -> Result<(), MuscleError> {
        let mut activation = self.activation.clone();
        activation
            .set_minimum_activation(minimum)
            .map_err(|source| MuscleError::parameter(&self.name, source))?;
        self.bounds = self.compute_bounds(self.mode, &self.curves, &self.pennation, &activation)?;
        self.activation = activation;
        Ok(())
    }

    /// Names of the integrated state variables, in derivative order.
    #[must_use]
    pub fn state_variable_names(&self) -> Vec<&'static str> {
        derivatives::state_variable_names(self.mode)
    }

    /// State variables seeded from the defaults.
    #[must_use]
    pub fn default_state_variables(&self) -> StateVariables {
        StateVariables {
            activation: self
                .mode
                .has_activation_state()
                .then(|| self.activation.clamp_activation(self.default_activation)),
            fiber_length: self.mode.has_fiber_length_state().then(|| {
                Length::new::<meter>(self.bounds.clamp(self.default_fiber_length))
            }),
        }
    }

    /// State variables and a fresh hint for the start of a run.
    ///
    /// Fiber length is placed at equilibrium for the default activation.
    ///
    /// # Errors
    ///
    /// Returns a [`MuscleError`] if the initial equilibrium cannot be found.
    pub fn initialize(
        &self,
        path: &PathKinematics,
    ) -> Result<(StateVariables, SolverHint), MuscleError> {
        let activation = self.activation.clamp_activation(self.default_activation);
        let equilibrium = self.compute_initial_fiber_equilibrium(path, activation)?;

        let mut variables = self.default_state_variables();
        if self.mode.has_fiber_length_state() {
            variables.fiber_length = Some(equilibrium.fiber_length);
        }
        Ok((
            variables,
            SolverHint::new(equilibrium.fiber_length, equilibrium.fiber_velocity),
        ))
    }

    /// Finds the fiber state at which fiber and tendon forces balance.
    ///
    /// A rigid tendon is solved in closed form. An elastic tendon is solved by
    /// Newton iteration over fiber length with the path speed shared between
    /// fiber and tendon by stiffness.
    ///
    /// # Errors
    ///
    /// Returns a [`MuscleError`] if the solve does not converge. This is fatal:
    /// the run cannot start without an initial equilibrium.
    pub fn compute_initial_fiber_equilibrium(
        &self,
        path: &PathKinematics,
        activation: f64,
    ) -> Result<FiberEquilibrium, MuscleError> {
        let inputs = self.inputs(path, self.activation.clamp_activation(activation), 0.0);
        let result = match self.mode.fiber {
            FiberDynamics::Rigid => rigid_equilibrium(self.mt(), &self.bounds, &inputs),
            FiberDynamics::ElasticFull | FiberDynamics::ElasticReduced => {
                elastic_initial_equilibrium(self.mt(), &self.bounds, &inputs, &self.initial_config)
            }
        };
        result.map_err(|source| MuscleError::equilibrium(&self.name, source))
    }

    /// Solves for fiber length and velocity with an elastic tendon and zero
    /// fiber acceleration, warm started from `hint`.
    ///
    /// A cold hint is seeded from an initial equilibrium.
    ///
    /// # Errors
    ///
    /// Returns a [`MuscleError`] if the solve diverges or exhausts
    /// `config.max_iterations`. A zero budget always fails.
    pub fn estimate_elastic_tendon_fiber_state(
        &self,
        path: &PathKinematics,
        activation: f64,
        activation_rate: f64,
        hint: &SolverHint,
        config: &EquilibriumConfig,
    ) -> Result<FiberEquilibrium, MuscleError> {
        let inputs = self.inputs(path, activation, activation_rate);
        self.reduced(&inputs, hint, config)
            .map_err(|source| MuscleError::equilibrium(&self.name, source))
    }

    /// Resolves the full kinematic state for one evaluation.
    ///
    /// `activation_rate` is only used when activation equals excitation;
    /// otherwise the rate comes from the activation dynamics. With reduced
    /// fiber dynamics the hint is updated on success. On a recoverable
    /// failure the previous hint is reused and the failure is returned as a
    /// warning.
    ///
    /// # Errors
    ///
    /// Returns a [`MuscleError`] on fatal failures: a collaborator domain
    /// violation, or a reduced solve failure with no previous hint to reuse.
    pub fn resolve_state(
        &self,
        path: &PathKinematics,
        variables: &StateVariables,
        excitation: f64,
        activation_rate: f64,
        hint: &mut SolverHint,
    ) -> Result<ResolvedState, MuscleError> {
        let (activation, activation_rate) = match self.mode.activation {
            ActivationMode::State => {
                let activation = self
                    .activation
                    .clamp_activation(variables.activation.unwrap_or(self.default_activation));
                (activation, self.activation.rate(excitation, activation))
            }
            ActivationMode::EqualsExcitation => {
                (self.activation.clamp_activation(excitation), activation_rate)
            }
        };
        let inputs = self.inputs(path, activation, activation_rate);

        let (equilibrium, warning) = match self.mode.fiber {
            FiberDynamics::Rigid => (
                rigid_equilibrium(self.mt(), &self.bounds, &inputs)
                    .map_err(|source| MuscleError::equilibrium(&self.name, source))?,
                None,
            ),
            FiberDynamics::ElasticFull => {
                let length = self.bounds.clamp(
                    variables
                        .fiber_length
                        .map_or(self.default_fiber_length, |length| length.get::<meter>()),
                );
                (self.integrated_fiber_state(&inputs, length)?, None)
            }
            FiberDynamics::ElasticReduced => {
                match self.reduced(&inputs, hint, &self.reduced_config) {
                    Ok(equilibrium) => {
                        hint.update(&equilibrium);
                        (equilibrium, None)
                    }
                    Err(
                        error @ (EquilibriumError::NotConverged { .. }
                        | EquilibriumError::Singular { .. }),
                    ) => {
                        let Some(stale) = self.stale_equilibrium(hint) else {
                            return Err(MuscleError::equilibrium(&self.name, error));
                        };
                        warn!(
                            muscle = %self.name,
                            error = %error,
                            "reduced fiber equilibrium failed, reusing previous solution"
                        );
                        (stale, Some(error))
                    }
                    Err(error) => return Err(MuscleError::equilibrium(&self.name, error)),
                }
            }
        };

        if equilibrium.is_clamped() {
            debug!(
                muscle = %self.name,
                iterations = equilibrium.iterations,
                "fiber clamped at minimum length"
            );
        }

        let length = equilibrium.fiber_length.get::<meter>();
        let velocity = equilibrium.fiber_velocity.get::<meter_per_second>();
        let pennation = self
            .pennation
            .velocity_projection(length, velocity)
            .map_err(|source| MuscleError::domain(&self.name, source))?;

        Ok(ResolvedState {
            state: MuscleKinematicState {
                fiber_length: equilibrium.fiber_length,
                fiber_velocity: equilibrium.fiber_velocity,
                pennation_angle: Angle::new::<radian>(pennation.angle),
                pennation_angular_velocity: AngularVelocity::new::<radian_per_second>(
                    pennation.angular_velocity,
                ),
                activation,
                status: equilibrium.status,
            },
            warning,
        })
    }

    /// Derives lengths, velocities, forces, stiffnesses and powers.
    ///
    /// # Errors
    ///
    /// Returns a [`MuscleError`] if the state's fiber length is below the
    /// pennation geometry's floor.
    pub fn evaluate(
        &self,
        path: &PathKinematics,
        state: &MuscleKinematicState,
    ) -> Result<MuscleEvaluation, MuscleError> {
        evaluate::evaluate(
            self.mt(),
            self.mode.fiber == FiberDynamics::Rigid,
            path,
            state,
        )
        .map_err(|source| MuscleError::domain(&self.name, source))
    }

    /// Right-hand side for the integrated state variables.
    #[must_use]
    pub fn state_derivatives(
        &self,
        state: &MuscleKinematicState,
        excitation: f64,
    ) -> StateDerivatives {
        StateDerivatives {
            activation: self
                .mode
                .has_activation_state()
                .then(|| self.activation.rate(excitation, state.activation)),
            fiber_length: self
                .mode
                .has_fiber_length_state()
                .then_some(state.fiber_velocity),
        }
    }

    /// Active fiber force along the tendon for a muscle whose tendon is held
    /// at slack length, at the given path kinematics.
    ///
    /// The fiber state comes from the rigid-tendon closed form regardless of
    /// the configured mode.
    ///
    /// # Errors
    ///
    /// Returns a [`MuscleError`] if the fiber length is below the pennation
    /// geometry's floor.
    pub fn inextensible_tendon_active_fiber_force(
        &self,
        path: &PathKinematics,
        activation: f64,
    ) -> Result<Force, MuscleError> {
        let activation = self.activation.clamp_activation(activation);
        let equilibrium = rigid_equilibrium(
            self.mt(),
            &self.bounds,
            &self.inputs(path, activation, 0.0),
        )
        .map_err(|source| MuscleError::equilibrium(&self.name, source))?;
        self.active_fiber_force_along_tendon(
            activation,
            equilibrium.fiber_length,
            equilibrium.fiber_velocity,
        )
    }

    /// Active fiber force projected onto the tendon, excluding passive force.
    ///
    /// # Errors
    ///
    /// Returns a [`MuscleError`] if the fiber length is below the pennation
    /// geometry's floor.
    pub fn active_fiber_force_along_tendon(
        &self,
        activation: f64,
        fiber_length: Length,
        fiber_velocity: Velocity,
    ) -> Result<Force, MuscleError> {
        let fiber = self
            .mt()
            .fiber(
                activation,
                fiber_length.get::<meter>(),
                fiber_velocity.get::<meter_per_second>(),
            )
            .map_err(|source| MuscleError::domain(&self.name, source))?;
        Ok(Force::new::<newton>(fiber.active_force * fiber.cos_pennation))
    }

    /// Whether the fiber sits on its floor and is trying to shorten further.
    #[must_use]
    pub fn is_fiber_state_clamped(&self, fiber_length: Length, fiber_velocity: Velocity) -> bool {
        self.bounds.is_fiber_state_clamped(
            fiber_length.get::<meter>(),
            fiber_velocity.get::<meter_per_second>(),
        )
    }

    /// Clamps a fiber length to the floor.
    #[must_use]
    pub fn clamp_fiber_length(&self, fiber_length: Length) -> Length {
        self.bounds.clamp_fiber_length(fiber_length)
    }

    fn mt(&self) -> Musculotendon<'_, C, P> {
        Musculotendon {
            parameters: &self.parameters,
            curves: &self.curves,
            pennation: &self.pennation,
        }
    }

    fn inputs(
        &self,
        path: &PathKinematics,
        activation: f64,
        activation_rate: f64,
    ) -> EquilibriumInputs {
        EquilibriumInputs {
            path_length: path.length.get::<meter>(),
            path_velocity: path.lengthening_speed.get::<meter_per_second>(),
            activation,
            activation_rate,
        }
    }

    fn compute_bounds(
        &self,
        mode: SimulationMode,
        curves: &C,
        pennation: &P,
        activation: &A,
    ) -> Result<Bounds, MuscleError> {
        Bounds::compute(mode, &self.parameters, curves, pennation, activation)
            .map_err(|source| MuscleError::configuration(&self.name, source))
    }

    /// Fiber velocity for an integrated fiber length, from the inverted
    /// force-velocity relation with activation floored.
    fn integrated_fiber_state(
        &self,
        inputs: &EquilibriumInputs,
        length: f64,
    ) -> Result<FiberEquilibrium, MuscleError> {
        let activation = inputs.activation.max(self.bounds.min_activation());
        let velocity = self
            .mt()
            .balancing_velocity(activation, length, inputs.path_length)
            .map_err(|source| MuscleError::domain(&self.name, source))?;

        let (velocity, status) = if self.bounds.is_fiber_state_clamped(length, velocity) {
            (velocity.max(0.0), EquilibriumStatus::ClampedAtMinimumLength)
        } else {
            (velocity, EquilibriumStatus::Converged)
        };
        Ok(FiberEquilibrium::new(length, velocity, status, 0.0, 0))
    }

    fn reduced(
        &self,
        inputs: &EquilibriumInputs,
        hint: &SolverHint,
        config: &EquilibriumConfig,
    ) -> Result<FiberEquilibrium, EquilibriumError> {
        let seed = match hint.seed() {
            Some(seed) => seed,
            None => {
                let initial = elastic_initial_equilibrium(
                    self.mt(),
                    &self.bounds,
                    inputs,
                    &self.initial_config,
                )?;
                (
                    initial.fiber_length.get::<meter>(),
                    initial.fiber_velocity.get::<meter_per_second>(),
                )
            }
        };
        estimate_elastic_tendon_fiber_state(self.mt(), &self.bounds, inputs, seed, config)
    }

    fn stale_equilibrium(&self, hint: &SolverHint) -> Option<FiberEquilibrium> {
        let (length, velocity) = hint.seed()?;
        let length = self.bounds.clamp(length);
        Some(if self.bounds.is_fiber_state_clamped(length, velocity) {
            FiberEquilibrium::new(
                length,
                velocity.max(0.0),
                EquilibriumStatus::ClampedAtMinimumLength,
                f64::NAN,
                0,
            )
        } else {
            FiberEquilibrium::new(length, velocity, EquilibriumStatus::Converged, f64::NAN, 0)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::support::constraint::{StrictlyPositive, UnitInterval};

    use super::test_support::{self, meters, meters_per_second, muscle, optimal_path_length, path};

    fn configuration(compliant: bool, dynamics: bool, reduced: bool) -> MuscleConfiguration {
        MuscleConfiguration {
            tendon_compliant: compliant,
            activation_dynamics: dynamics,
            reduced_fiber_dynamics: reduced,
        }
    }

    /// Path that stretches the tendon slightly past slack at optimal fiber length.
    fn loaded_path() -> PathKinematics {
        path(optimal_path_length() + 0.004, 0.0)
    }

    #[test]
    fn rigid_tendon_at_optimal_path_develops_isometric_force() {
        let muscle = muscle(configuration(false, false, false));
        let path = path(optimal_path_length(), 0.0);

        let resolved = muscle
            .resolve_state(&path, &StateVariables::default(), 1.0, 0.0, &mut SolverHint::cold())
            .unwrap();
        assert!(resolved.warning.is_none());
        assert_eq!(resolved.state.status, EquilibriumStatus::Converged);
        assert_relative_eq!(meters(resolved.state.fiber_length), 0.1, epsilon = 1e-12);
        assert_relative_eq!(meters_per_second(resolved.state.fiber_velocity), 0.0);
        assert_relative_eq!(
            resolved.state.pennation_angle.get::<radian>(),
            test_support::PENNATION,
            epsilon = 1e-12
        );

        let evaluation = muscle.evaluate(&path, &resolved.state).unwrap();
        let dynamics = evaluation.dynamics;
        assert_relative_eq!(dynamics.fiber_force.get::<newton>(), 1000.0, epsilon = 1e-9);
        assert_relative_eq!(
            dynamics.tendon_force.get::<newton>(),
            1000.0 * test_support::PENNATION.cos(),
            epsilon = 1e-9
        );
        assert!(dynamics.tendon_stiffness.value.is_infinite());
        assert_relative_eq!(
            dynamics.muscle_stiffness.value,
            dynamics.fiber_stiffness_along_tendon.value
        );
        assert_relative_eq!(evaluation.length.tendon_strain, 0.0);
    }

    #[test]
    fn rigid_tendon_clamps_short_paths_without_shortening() {
        let muscle = muscle(configuration(false, false, false));
        let path = path(0.2, -0.5);

        let resolved = muscle
            .resolve_state(&path, &StateVariables::default(), 0.5, 0.0, &mut SolverHint::cold())
            .unwrap();
        assert_eq!(
            resolved.state.status,
            EquilibriumStatus::ClampedAtMinimumLength
        );
        assert_eq!(resolved.state.fiber_length, muscle.bounds().min_fiber_length());
        assert_relative_eq!(meters_per_second(resolved.state.fiber_velocity), 0.0);
    }

    #[test]
    fn elastic_full_at_the_floor_has_a_finite_non_negative_rate() {
        let muscle = muscle(MuscleConfiguration::default());
        let path = path(0.2, 0.0);
        let variables = StateVariables {
            activation: Some(0.0),
            fiber_length: Some(Length::new::<meter>(0.0)),
        };

        let resolved = muscle
            .resolve_state(&path, &variables, 0.0, 0.0, &mut SolverHint::cold())
            .unwrap();
        let state = resolved.state;
        assert_eq!(state.status, EquilibriumStatus::ClampedAtMinimumLength);
        assert_eq!(state.fiber_length, muscle.bounds().min_fiber_length());
        assert_relative_eq!(state.activation, muscle.bounds().min_activation());

        let derivatives = muscle.state_derivatives(&state, 0.0);
        let rates = derivatives.as_vec();
        assert_eq!(rates.len(), 2);
        assert!(rates.iter().all(|rate| rate.is_finite()));
        assert!(rates[1] >= 0.0);
    }

    #[test]
    fn elastic_evaluation_balances_fiber_and_tendon() {
        let muscle = muscle(MuscleConfiguration::default());
        let path = loaded_path();
        let equilibrium = muscle.compute_initial_fiber_equilibrium(&path, 0.5).unwrap();
        assert_eq!(equilibrium.status, EquilibriumStatus::Converged);

        let variables = StateVariables {
            activation: Some(0.5),
            fiber_length: Some(equilibrium.fiber_length),
        };
        let resolved = muscle
            .resolve_state(&path, &variables, 0.5, 0.0, &mut SolverHint::cold())
            .unwrap();
        assert_relative_eq!(
            meters_per_second(resolved.state.fiber_velocity),
            0.0,
            epsilon = 1e-6
        );

        let evaluation = muscle.evaluate(&path, &resolved.state).unwrap();
        let dynamics = evaluation.dynamics;
        assert_relative_eq!(
            dynamics.tendon_force.get::<newton>(),
            dynamics.fiber_force_along_tendon.get::<newton>(),
            max_relative = 1e-6
        );
        assert!(dynamics.tendon_stiffness.value.is_finite());
        assert!(evaluation.length.tendon_strain > 0.0);
        assert_relative_eq!(dynamics.muscle_power.get::<uom::si::power::watt>(), 0.0);

        let active = muscle
            .active_fiber_force_along_tendon(
                0.5,
                resolved.state.fiber_length,
                resolved.state.fiber_velocity,
            )
            .unwrap();
        assert_relative_eq!(
            active.get::<newton>(),
            dynamics.active_fiber_force_along_tendon.get::<newton>()
        );
    }

    #[test]
    fn reduced_dynamics_updates_the_hint() {
        let muscle = muscle(configuration(true, false, true));
        let path = loaded_path();
        let (variables, mut hint) = muscle.initialize(&path).unwrap();
        assert!(variables.fiber_length.is_none());
        assert!(!hint.is_cold());

        let resolved = muscle
            .resolve_state(&path, &variables, 0.3, 0.0, &mut hint)
            .unwrap();
        assert!(resolved.warning.is_none());
        assert_eq!(hint.fiber_length(), Some(resolved.state.fiber_length));
        assert_eq!(hint.fiber_velocity(), Some(resolved.state.fiber_velocity));
    }

    #[test]
    fn reduced_failure_reuses_previous_hint() {
        let muscle = muscle(configuration(true, false, true)).with_reduced_equilibrium_config(
            EquilibriumConfig {
                max_iterations: 0,
                ..EquilibriumConfig::reduced()
            },
        );
        let path = loaded_path();
        let previous = SolverHint::new(
            Length::new::<meter>(0.098),
            Velocity::new::<meter_per_second>(0.0),
        );

        let mut hint = previous;
        let resolved = muscle
            .resolve_state(&path, &StateVariables::default(), 0.3, 0.0, &mut hint)
            .unwrap();
        assert!(matches!(
            resolved.warning,
            Some(EquilibriumError::NotConverged { iterations: 0, .. })
        ));
        assert_eq!(hint, previous);
        assert_relative_eq!(meters(resolved.state.fiber_length), 0.098);

        let error = muscle
            .resolve_state(&path, &StateVariables::default(), 0.3, 0.0, &mut SolverHint::cold())
            .unwrap_err();
        assert!(matches!(error, MuscleError::Equilibrium { .. }));
    }

    #[test]
    fn explicit_reduced_estimate_matches_resolved_state() {
        let muscle = muscle(configuration(true, false, true));
        let path = loaded_path();
        let (_, mut hint) = muscle.initialize(&path).unwrap();

        let estimate = muscle
            .estimate_elastic_tendon_fiber_state(
                &path,
                0.3,
                0.0,
                &SolverHint::cold(),
                &EquilibriumConfig::reduced(),
            )
            .unwrap();
        let resolved = muscle
            .resolve_state(&path, &StateVariables::default(), 0.3, 0.0, &mut hint)
            .unwrap();
        assert_relative_eq!(
            meters(estimate.fiber_length),
            meters(resolved.state.fiber_length),
            epsilon = 1e-7
        );
    }

    #[test]
    fn finalize_locks_configuration() {
        let mut muscle = muscle(MuscleConfiguration::default());
        muscle
            .set_configuration(configuration(true, true, true))
            .unwrap();
        assert_eq!(muscle.mode().fiber, FiberDynamics::ElasticReduced);

        muscle.finalize();
        let error = muscle
            .set_configuration(MuscleConfiguration::default())
            .unwrap_err();
        assert!(matches!(
            error,
            MuscleError::Configuration {
                source: ConfigurationError::Finalized,
                ..
            }
        ));
        assert_eq!(muscle.mode().fiber, FiberDynamics::ElasticReduced);
    }

    #[test]
    fn elastic_full_rejects_singular_settings() {
        let mut muscle = muscle(MuscleConfiguration::default());

        let error = muscle
            .set_minimum_activation(UnitInterval::zero())
            .unwrap_err();
        assert!(matches!(
            error,
            MuscleError::Configuration {
                source: ConfigurationError::ZeroMinimumActivation,
                ..
            }
        ));
        assert_relative_eq!(muscle.bounds().min_activation(), 0.01);

        assert!(
            muscle
                .set_maximum_pennation_angle(Angle::new::<radian>(std::f64::consts::FRAC_PI_2))
                .is_err()
        );

        let mut rigid = test_support::muscle(configuration(false, true, false));
        rigid.set_minimum_activation(UnitInterval::zero()).unwrap();
        assert_relative_eq!(rigid.bounds().min_activation(), 0.0);
    }

    #[test]
    fn state_layout_follows_mode() {
        let full = muscle(MuscleConfiguration::default());
        assert_eq!(full.state_variable_names(), vec!["activation", "fiber_length"]);
        let defaults = full.default_state_variables();
        assert_relative_eq!(defaults.activation.unwrap(), 0.05);
        assert_eq!(defaults.fiber_length, Some(Length::new::<meter>(0.1)));

        let rigid = muscle(configuration(false, false, false));
        assert!(rigid.state_variable_names().is_empty());
        assert_eq!(rigid.default_state_variables(), StateVariables::default());
    }

    #[test]
    fn inextensible_tendon_force_ignores_tendon_stretch() {
        let muscle = muscle(MuscleConfiguration::default());
        let force = muscle
            .inextensible_tendon_active_fiber_force(&path(optimal_path_length(), 0.0), 0.5)
            .unwrap();
        assert_relative_eq!(
            force.get::<newton>(),
            500.0 * test_support::PENNATION.cos(),
            epsilon = 1e-9
        );

        let short = muscle
            .inextensible_tendon_active_fiber_force(&path(0.2, -0.5), 0.5)
            .unwrap();
        assert!(short.get::<newton>() > 0.0);
        assert!(short < force);
    }

    #[test]
    fn highly_pennate_fiber_at_the_floor_reaches_the_ceiling() {
        let parameters = MuscleParameters::new(
            StrictlyPositive::new(Force::new::<newton>(1000.0)).unwrap(),
            StrictlyPositive::new(Length::new::<meter>(0.1)).unwrap(),
            StrictlyPositive::new(Length::new::<meter>(0.2)).unwrap(),
            crate::support::constraint::NonNegative::new(Angle::new::<radian>(0.7)).unwrap(),
        );
        let muscle =
            EquilibriumMuscle::new("pennate", parameters, MuscleConfiguration::default()).unwrap();
        let ceiling = 0.1_f64.acos();
        let floor_along_tendon = meters(muscle.bounds().min_fiber_length_along_tendon());
        let variables = StateVariables {
            activation: Some(0.0),
            fiber_length: Some(Length::new::<meter>(0.0)),
        };

        for stretch in [0.001, 0.003, 0.006] {
            let path = path(0.2 + floor_along_tendon + stretch, 0.0);
            let state = muscle
                .resolve_state(&path, &variables, 0.0, 0.0, &mut SolverHint::cold())
                .unwrap()
                .state;

            assert_eq!(state.fiber_length, muscle.bounds().min_fiber_length());
            assert_relative_eq!(state.pennation_angle.get::<radian>(), ceiling, epsilon = 1e-6);
            assert_relative_eq!(state.activation, muscle.bounds().min_activation());

            let rates = muscle.state_derivatives(&state, 0.0).as_vec();
            assert!(rates.iter().all(|rate| rate.is_finite()));
            assert!(rates[1] >= 0.0);

            let dynamics = muscle.evaluate(&path, &state).unwrap().dynamics;
            assert_relative_eq!(
                dynamics.tendon_force.get::<newton>(),
                dynamics.fiber_force_along_tendon.get::<newton>(),
                max_relative = 1e-8
            );
        }
    }

    #[test]
    fn clamp_queries_use_the_floor() {
        let muscle = muscle(MuscleConfiguration::default());
        let floor = muscle.bounds().min_fiber_length();
        let shortening = Velocity::new::<meter_per_second>(-0.01);

        assert_eq!(muscle.clamp_fiber_length(floor * 0.5), floor);
        assert!(muscle.is_fiber_state_clamped(floor, shortening));
        assert!(!muscle.is_fiber_state_clamped(floor, -shortening));
        assert!(!muscle.is_fiber_state_clamped(floor * 2.0, shortening));
    }
}
