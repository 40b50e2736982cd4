//! Force and stiffness of the fiber and tendon at a single operating point.
//!
//! Everything here is in SI scalars. The solvers and the state evaluator
//! share these computations so a converged equilibrium and the reported
//! dynamics never disagree.

use crate::support::{
    curve::{Curve, ForceVelocityCurve, MuscleCurves},
    pennation::{DomainError, PennationModel},
};

use super::MuscleParameters;

/// Borrowed view of the pieces that determine musculotendon mechanics.
#[derive(Debug)]
pub(super) struct Musculotendon<'a, C, P> {
    pub(super) parameters: &'a MuscleParameters,
    pub(super) curves: &'a C,
    pub(super) pennation: &'a P,
}

impl<C, P> Clone for Musculotendon<'_, C, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C, P> Copy for Musculotendon<'_, C, P> {}

/// Fiber mechanics at a given activation, length and velocity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct FiberPoint {
    pub(super) activation: f64,
    pub(super) length: f64,
    pub(super) velocity: f64,
    pub(super) normalized_length: f64,
    pub(super) normalized_velocity: f64,
    pub(super) length_along_tendon: f64,

    pub(super) pennation_angle: f64,
    pub(super) cos_pennation: f64,
    pub(super) sin_pennation: f64,
    /// `∂φ/∂l`.
    pub(super) pennation_derivative: f64,
    /// `∂l_along_tendon/∂l`.
    pub(super) along_tendon_derivative: f64,

    pub(super) active_force_length: f64,
    pub(super) active_force_length_derivative: f64,
    pub(super) force_velocity: f64,
    pub(super) force_velocity_derivative: f64,
    pub(super) passive_force_length: f64,
    pub(super) passive_force_length_derivative: f64,

    pub(super) active_force: f64,
    pub(super) passive_force: f64,
    pub(super) force: f64,
    pub(super) force_along_tendon: f64,

    /// `∂F_fiber/∂l`.
    pub(super) stiffness: f64,
    /// `∂F_along_tendon/∂l`.
    pub(super) force_along_tendon_derivative: f64,
}

impl FiberPoint {
    /// `∂F_along_tendon/∂l_along_tendon`.
    pub(super) fn stiffness_along_tendon(&self) -> f64 {
        self.force_along_tendon_derivative / self.along_tendon_derivative
    }
}

/// Tendon mechanics at a given length.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct TendonPoint {
    pub(super) length: f64,
    pub(super) normalized_length: f64,
    pub(super) force_length: f64,
    pub(super) force: f64,
    pub(super) stiffness: f64,
}

impl<C: MuscleCurves, P: PennationModel> Musculotendon<'_, C, P> {
    pub(super) fn fiso(&self) -> f64 {
        self.parameters.fiso()
    }

    pub(super) fn fiber(
        &self,
        activation: f64,
        length: f64,
        velocity: f64,
    ) -> Result<FiberPoint, DomainError> {
        if !velocity.is_finite() {
            return Err(DomainError::NonFinite { value: velocity });
        }
        let fiso = self.parameters.fiso();
        let lopt = self.parameters.lopt();
        let vmax = self.parameters.max_velocity();

        let pennation_angle = self.pennation.pennation_angle(length)?;
        let pennation_derivative = self.pennation.pennation_angle_derivative(length)?;
        let length_along_tendon = self.pennation.fiber_length_along_tendon(length)?;
        let (sin_pennation, cos_pennation) = pennation_angle.sin_cos();
        let along_tendon_derivative =
            cos_pennation - length * sin_pennation * pennation_derivative;

        let normalized_length = length / lopt;
        let normalized_velocity = velocity / vmax;

        let curves = self.curves;
        let fal = curves.active_force_length().value(normalized_length);
        let dfal = curves.active_force_length().derivative(normalized_length);
        let fv = curves.force_velocity().value(normalized_velocity);
        let dfv = curves.force_velocity().derivative(normalized_velocity);
        let fpe = curves.fiber_force_length().value(normalized_length);
        let dfpe = curves.fiber_force_length().derivative(normalized_length);

        let active_force = fiso * activation * fal * fv;
        let passive_force = fiso * fpe;
        let force = active_force + passive_force;
        let stiffness = fiso * (activation * fv * dfal + dfpe) / lopt;

        Ok(FiberPoint {
            activation,
            length,
            velocity,
            normalized_length,
            normalized_velocity,
            length_along_tendon,
            pennation_angle,
            cos_pennation,
            sin_pennation,
            pennation_derivative,
            along_tendon_derivative,
            active_force_length: fal,
            active_force_length_derivative: dfal,
            force_velocity: fv,
            force_velocity_derivative: dfv,
            passive_force_length: fpe,
            passive_force_length_derivative: dfpe,
            active_force,
            passive_force,
            force,
            force_along_tendon: force * cos_pennation,
            stiffness,
            force_along_tendon_derivative: stiffness * cos_pennation
                - force * sin_pennation * pennation_derivative,
        })
    }

    pub(super) fn tendon(&self, length: f64) -> TendonPoint {
        let fiso = self.parameters.fiso();
        let lts = self.parameters.lts();
        let normalized_length = length / lts;
        let curve = self.curves.tendon_force_length();
        let force_length = curve.value(normalized_length);

        TendonPoint {
            length,
            normalized_length,
            force_length,
            force: fiso * force_length,
            stiffness: fiso * curve.derivative(normalized_length) / lts,
        }
    }

    /// Tendon mechanics once the fiber takes its share of the path.
    pub(super) fn tendon_beside(&self, path_length: f64, fiber: &FiberPoint) -> TendonPoint {
        self.tendon(path_length - fiber.length_along_tendon)
    }

    /// `∂F_along_tendon/∂v`.
    pub(super) fn force_along_tendon_velocity_partial(&self, fiber: &FiberPoint) -> f64 {
        self.active_force_velocity_partial(fiber) * fiber.cos_pennation
    }

    /// `∂(∂F_along_tendon/∂l)/∂v`.
    pub(super) fn force_along_tendon_derivative_velocity_partial(&self, fiber: &FiberPoint) -> f64 {
        let stiffness_partial = self.parameters.fiso()
            * fiber.activation
            * fiber.force_velocity_derivative
            * fiber.active_force_length_derivative
            / (self.parameters.lopt() * self.parameters.max_velocity());

        stiffness_partial * fiber.cos_pennation
            - self.active_force_velocity_partial(fiber)
                * fiber.sin_pennation
                * fiber.pennation_derivative
    }

    /// Fiber velocity that balances fiber and tendon force at a given length.
    ///
    /// Inverts the force-velocity curve:
    ///
    /// ```text
    /// f_V = (f_SE / cos φ - f_PE) / (a · f_AL)
    /// ```
    ///
    /// Returns zero when the fiber cannot generate active force.
    pub(super) fn balancing_velocity(
        &self,
        activation: f64,
        length: f64,
        path_length: f64,
    ) -> Result<f64, DomainError> {
        let fiber = self.fiber(activation, length, 0.0)?;
        let tendon = self.tendon_beside(path_length, &fiber);
        let drive = activation * fiber.active_force_length;
        if drive <= 0.0 {
            return Ok(0.0);
        }

        let target =
            (tendon.force_length / fiber.cos_pennation - fiber.passive_force_length) / drive;
        let velocity = self.curves.force_velocity().inverse(target) * self.parameters.max_velocity();
        if velocity.is_finite() {
            Ok(velocity)
        } else {
            Err(DomainError::NonFinite { value: velocity })
        }
    }

    fn active_force_velocity_partial(&self, fiber: &FiberPoint) -> f64 {
        self.parameters.fiso()
            * fiber.activation
            * fiber.active_force_length
            * fiber.force_velocity_derivative
            / self.parameters.max_velocity()
    }
}
