use std::f64::consts::FRAC_PI_2;

use uom::si::{
    angle::radian,
    f64::{Angle, Length},
    length::meter,
};

use crate::support::{
    activation::ActivationModel,
    curve::{ActiveForceLengthCurve, MuscleCurves},
    pennation::PennationModel,
};

use super::{ConfigurationError, FiberDynamics, MuscleParameters, SimulationMode};

/// Numeric floors and ceilings used for clamping and singularity avoidance.
///
/// Recomputed whenever parameters, curves, pennation geometry, activation
/// dynamics or the mode change, and never during a solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    min_fiber_length: f64,
    min_fiber_length_along_tendon: f64,
    min_activation: f64,
    max_pennation_angle: f64,
}

impl Bounds {
    /// Derives the bounds for a mode from the muscle's collaborators.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if elastic full fiber dynamics is
    /// requested with a collaborator that would make the inverted
    /// force-velocity relation singular.
    pub fn compute(
        mode: SimulationMode,
        parameters: &MuscleParameters,
        curves: &impl MuscleCurves,
        pennation: &impl PennationModel,
        activation: &impl ActivationModel,
    ) -> Result<Self, ConfigurationError> {
        let active_force_length = curves.active_force_length();
        let min_activation = activation.minimum_activation();
        let max_pennation_angle = pennation.maximum_pennation_angle();

        if mode.fiber == FiberDynamics::ElasticFull {
            if min_activation <= 0.0 {
                return Err(ConfigurationError::ZeroMinimumActivation);
            }
            if max_pennation_angle >= FRAC_PI_2 {
                return Err(ConfigurationError::PennationCeilingTooHigh {
                    angle: max_pennation_angle,
                });
            }
            if active_force_length.minimum_value() <= 0.0 {
                return Err(ConfigurationError::SingularActiveForceLength);
            }
        }

        let geometric_floor = pennation.minimum_fiber_length();
        let min_fiber_length = if active_force_length.minimum_value() > 0.0 {
            geometric_floor
                .max(active_force_length.minimum_active_fiber_length() * parameters.lopt())
        } else {
            geometric_floor
        };

        Ok(Self {
            min_fiber_length,
            min_fiber_length_along_tendon: pennation.fiber_length_along_tendon(min_fiber_length)?,
            min_activation,
            max_pennation_angle,
        })
    }

    /// Clamps a fiber length to the floor.
    #[must_use]
    pub fn clamp_fiber_length(&self, fiber_length: Length) -> Length {
        Length::new::<meter>(self.clamp(fiber_length.get::<meter>()))
    }

    /// Whether the fiber sits on its floor and is trying to shorten further.
    #[must_use]
    pub fn is_fiber_state_clamped(&self, fiber_length: f64, fiber_velocity: f64) -> bool {
        fiber_length <= self.min_fiber_length && fiber_velocity <= 0.0
    }

    #[must_use]
    pub fn min_fiber_length(&self) -> Length {
        Length::new::<meter>(self.min_fiber_length)
    }

    #[must_use]
    pub fn min_fiber_length_along_tendon(&self) -> Length {
        Length::new::<meter>(self.min_fiber_length_along_tendon)
    }

    #[must_use]
    pub fn min_activation(&self) -> f64 {
        self.min_activation
    }

    #[must_use]
    pub fn max_pennation_angle(&self) -> Angle {
        Angle::new::<radian>(self.max_pennation_angle)
    }

    pub(super) fn clamp(&self, fiber_length: f64) -> f64 {
        fiber_length.max(self.min_fiber_length)
    }

    pub(super) fn floor(&self) -> f64 {
        self.min_fiber_length
    }

    pub(super) fn floor_along_tendon(&self) -> f64 {
        self.min_fiber_length_along_tendon
    }
}
