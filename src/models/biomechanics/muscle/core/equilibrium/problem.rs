//! Problem formulation for the initial fiber equilibrium.

use std::convert::Infallible;

use twine_core::{EquationProblem, Model};
use uom::si::{f64::Length, length::meter};

use crate::support::{
    curve::MuscleCurves,
    pennation::{DomainError, PennationModel},
};

use super::{
    super::mechanics::{FiberPoint, Musculotendon, TendonPoint},
    EquilibriumInputs,
};

/// Force balance at a candidate fiber length.
///
/// Fiber velocity is not free here: the path lengthening speed is shared
/// between fiber and tendon in proportion to their stiffnesses.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct InitialPoint {
    pub(super) fiber: FiberPoint,
    pub(super) tendon: TendonPoint,

    /// Fiber force along the tendon minus tendon force, in newtons.
    pub(super) residual: f64,

    /// `∂residual/∂l`, holding fiber velocity fixed.
    pub(super) slope: f64,
}

pub(super) fn initial_point<C: MuscleCurves, P: PennationModel>(
    mt: Musculotendon<'_, C, P>,
    inputs: &EquilibriumInputs,
    fiber_length: f64,
) -> Result<InitialPoint, DomainError> {
    let isometric = mt.fiber(inputs.activation, fiber_length, 0.0)?;
    let tendon = mt.tendon_beside(inputs.path_length, &isometric);

    let tendon_stiffness = tendon.stiffness;
    let total_stiffness = tendon_stiffness + isometric.stiffness_along_tendon();
    let significant = f64::EPSILON.sqrt() * mt.fiso() / mt.parameters.lopt();
    let velocity_along_tendon = if tendon.normalized_length > 1.0 && total_stiffness.abs() > significant {
        inputs.path_velocity * tendon_stiffness / total_stiffness
    } else {
        inputs.path_velocity
    };

    let fiber = mt.fiber(
        inputs.activation,
        fiber_length,
        velocity_along_tendon / isometric.along_tendon_derivative,
    )?;

    Ok(InitialPoint {
        residual: fiber.force_along_tendon - tendon.force,
        slope: fiber.force_along_tendon_derivative
            + tendon_stiffness * fiber.along_tendon_derivative,
        fiber,
        tendon,
    })
}

/// Model adapter exposing fiber length as the sole input.
pub(super) struct InitialEquilibriumModel<'a, C, P> {
    mt: Musculotendon<'a, C, P>,
    inputs: EquilibriumInputs,
}

impl<'a, C, P> InitialEquilibriumModel<'a, C, P> {
    pub(super) fn new(mt: Musculotendon<'a, C, P>, inputs: EquilibriumInputs) -> Self {
        Self { mt, inputs }
    }
}

impl<C: MuscleCurves, P: PennationModel> Model for InitialEquilibriumModel<'_, C, P> {
    type Input = Length;
    type Output = InitialPoint;
    type Error = DomainError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        initial_point(self.mt, &self.inputs, input.get::<meter>())
    }
}

/// Equation problem for the initial equilibrium.
///
/// The residual is normalized by max isometric force.
pub(super) struct InitialEquilibriumProblem {
    max_isometric_force: f64,
}

impl InitialEquilibriumProblem {
    pub(super) fn new(max_isometric_force: f64) -> Self {
        Self {
            max_isometric_force,
        }
    }
}

impl EquationProblem<1> for InitialEquilibriumProblem {
    type Input = Length;
    type Output = InitialPoint;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(Length::new::<meter>(x[0]))
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<[f64; 1], Self::Error> {
        Ok([output.residual / self.max_isometric_force])
    }
}
