use thiserror::Error;

use crate::support::{constraint::ConstraintError, pennation::DomainError};

/// The three independent switches that select a muscle's simulation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MuscleConfiguration {
    /// Whether the tendon stretches under load.
    pub tendon_compliant: bool,

    /// Whether activation lags excitation as an integrated state.
    pub activation_dynamics: bool,

    /// Whether fiber length is solved quasi-statically each evaluation
    /// instead of being integrated.
    pub reduced_fiber_dynamics: bool,
}

impl Default for MuscleConfiguration {
    fn default() -> Self {
        Self {
            tendon_compliant: true,
            activation_dynamics: true,
            reduced_fiber_dynamics: false,
        }
    }
}

impl MuscleConfiguration {
    /// Derives the simulation mode.
    ///
    /// # Errors
    ///
    /// See [`classify`].
    pub fn classify(&self) -> Result<SimulationMode, ConfigurationError> {
        classify(
            self.tendon_compliant,
            self.activation_dynamics,
            self.reduced_fiber_dynamics,
        )
    }
}

/// How fiber length is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FiberDynamics {
    /// Tendon length is fixed; fiber length follows the path in closed form.
    Rigid,

    /// Fiber length is an integrated state driven by the inverted force-velocity relation.
    ElasticFull,

    /// Fiber length and velocity are solved each evaluation assuming zero fiber acceleration.
    ElasticReduced,
}

/// How activation is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivationMode {
    /// Activation is an integrated state.
    State,

    /// Activation equals excitation.
    EqualsExcitation,
}

/// A muscle's simulation mode, fixed once the owning system is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationMode {
    pub fiber: FiberDynamics,
    pub activation: ActivationMode,
}

impl SimulationMode {
    /// Whether activation is carried in the integrator's state vector.
    #[must_use]
    pub fn has_activation_state(&self) -> bool {
        self.activation == ActivationMode::State
    }

    /// Whether fiber length is carried in the integrator's state vector.
    #[must_use]
    pub fn has_fiber_length_state(&self) -> bool {
        self.fiber == FiberDynamics::ElasticFull
    }
}

/// Derives the simulation mode from the three configuration switches.
///
/// # Errors
///
/// Returns [`ConfigurationError::ReducedDynamicsRequiresCompliantTendon`] when
/// reduced fiber dynamics is requested with a rigid tendon.
pub fn classify(
    tendon_compliant: bool,
    activation_dynamics: bool,
    reduced_fiber_dynamics: bool,
) -> Result<SimulationMode, ConfigurationError> {
    let fiber = match (tendon_compliant, reduced_fiber_dynamics) {
        (false, true) => return Err(ConfigurationError::ReducedDynamicsRequiresCompliantTendon),
        (false, false) => FiberDynamics::Rigid,
        (true, false) => FiberDynamics::ElasticFull,
        (true, true) => FiberDynamics::ElasticReduced,
    };

    let activation = if activation_dynamics {
        ActivationMode::State
    } else {
        ActivationMode::EqualsExcitation
    };

    Ok(SimulationMode { fiber, activation })
}

/// Errors raised while configuring a muscle, before any simulation step runs.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[non_exhaustive]
pub enum ConfigurationError {
    #[error("reduced fiber dynamics requires a compliant tendon")]
    ReducedDynamicsRequiresCompliantTendon,

    #[error("configuration cannot change after the muscle is finalized")]
    Finalized,

    #[error("full fiber dynamics with an elastic tendon requires a minimum activation above zero")]
    ZeroMinimumActivation,

    #[error(
        "full fiber dynamics with an elastic tendon requires a maximum pennation angle below 90 degrees, got {angle} rad"
    )]
    PennationCeilingTooHigh { angle: f64 },

    #[error(
        "full fiber dynamics with an elastic tendon requires an active force-length curve with a minimum above zero"
    )]
    SingularActiveForceLength,

    #[error("invalid parameter")]
    Parameter(#[from] ConstraintError),

    #[error("pennation geometry rejected the fiber length floor")]
    Geometry(#[from] DomainError),
}
