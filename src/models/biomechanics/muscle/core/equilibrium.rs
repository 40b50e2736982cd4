//! Fiber equilibrium solvers.
//!
//! Fiber force projected onto the tendon must equal tendon force. Because
//! that constraint is algebraic, recovering fiber state takes a root solve:
//!
//! - **Initial equilibrium** (rigid or elastic full dynamics): a closed form
//!   for a rigid tendon, otherwise a Newton iteration over fiber length with a
//!   bisection fallback once the Newton slope vanishes.
//! - **Reduced dynamics**: a damped two-variable Newton iteration over fiber
//!   length and velocity, driving both the force balance and its time
//!   derivative to zero. It is warm started from a [`SolverHint`].
//!
//! Solvers clamp fiber length to its floor instead of failing there, and a
//! clamped fiber never shortens.

mod config;
mod error;
mod hint;
mod initial;
mod problem;
mod reduced;

pub use config::EquilibriumConfig;
pub use error::EquilibriumError;
pub use hint::SolverHint;

pub(crate) use initial::{elastic_initial_equilibrium, rigid_equilibrium};
pub(crate) use reduced::estimate_elastic_tendon_fiber_state;

use uom::si::{
    f64::{Length, Velocity},
    length::meter,
    velocity::meter_per_second,
};

/// How an equilibrium solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquilibriumStatus {
    /// The residual met the tolerance with the fiber above its floor.
    Converged,

    /// The fiber is held at its minimum length and its velocity is non-negative.
    ///
    /// Only the force balance along the fiber length direction is enforced.
    ClampedAtMinimumLength,
}

/// Result of a successful fiber equilibrium solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiberEquilibrium {
    pub fiber_length: Length,
    pub fiber_velocity: Velocity,
    pub status: EquilibriumStatus,

    /// Final residual norm, normalized by max isometric force.
    pub residual: f64,

    /// Newton (or bisection) iterations spent.
    pub iterations: usize,
}

impl FiberEquilibrium {
    pub(crate) fn new(
        fiber_length: f64,
        fiber_velocity: f64,
        status: EquilibriumStatus,
        residual: f64,
        iterations: usize,
    ) -> Self {
        Self {
            fiber_length: Length::new::<meter>(fiber_length),
            fiber_velocity: Velocity::new::<meter_per_second>(fiber_velocity),
            status,
            residual,
            iterations,
        }
    }

    pub(crate) fn is_clamped(&self) -> bool {
        self.status == EquilibriumStatus::ClampedAtMinimumLength
    }
}

/// Operating conditions shared by every equilibrium solve, in SI.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct EquilibriumInputs {
    pub(crate) path_length: f64,
    pub(crate) path_velocity: f64,
    pub(crate) activation: f64,

    /// Activation rate, only used by the reduced time-derivative residual.
    pub(crate) activation_rate: f64,
}
