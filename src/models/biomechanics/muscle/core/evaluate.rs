//! Derived kinematic and dynamic quantities of a resolved muscle state.
//!
//! Nothing here re-checks the pennation ceiling. Inputs are assumed to come
//! from a resolved state that already respects it, and projections near 90°
//! are propagated as they are.
//!
//! With a rigid tendon the reported tendon length is the slack length and the
//! tendon velocity is zero. Both are nominal while the fiber is clamped at its
//! floor, since the path may then be shorter than slack length plus the
//! fiber's floor along the tendon.

use uom::si::{
    angle::radian,
    angular_velocity::radian_per_second,
    f64::{Angle, AngularVelocity, Force, Length, Power, Velocity},
    force::newton,
    length::meter,
    power::watt,
    velocity::meter_per_second,
};

use crate::support::{
    curve::MuscleCurves,
    pennation::{DomainError, PennationModel},
    units::{LinearStiffness, newtons_per_meter},
};

use super::{MuscleKinematicState, PathKinematics, mechanics::Musculotendon};

/// Lengths of the fiber and tendon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuscleLengthInfo {
    pub fiber_length: Length,
    pub fiber_length_along_tendon: Length,
    pub normalized_fiber_length: f64,
    pub tendon_length: Length,
    pub normalized_tendon_length: f64,
    pub tendon_strain: f64,
    pub pennation_angle: Angle,
}

/// Velocities of the fiber and tendon.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FiberVelocityInfo {
    pub fiber_velocity: Velocity,
    pub fiber_velocity_along_tendon: Velocity,
    pub normalized_fiber_velocity: f64,
    pub tendon_velocity: Velocity,
    pub pennation_angular_velocity: AngularVelocity,
}

/// Force multipliers, forces, stiffnesses and powers.
///
/// Powers are `-force · velocity`, so a shortening element doing work on
/// the skeleton reports positive power.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuscleDynamicsInfo {
    pub activation: f64,

    pub active_force_length_multiplier: f64,
    pub passive_force_length_multiplier: f64,
    pub force_velocity_multiplier: f64,
    pub tendon_force_multiplier: f64,

    pub fiber_force: Force,
    pub active_fiber_force: Force,
    pub passive_fiber_force: Force,
    pub fiber_force_along_tendon: Force,
    pub active_fiber_force_along_tendon: Force,
    pub passive_fiber_force_along_tendon: Force,
    pub tendon_force: Force,

    /// `∂F_fiber/∂l_fiber`.
    pub fiber_stiffness: LinearStiffness,

    /// `∂F_fiber_along_tendon/∂l_fiber_along_tendon`.
    pub fiber_stiffness_along_tendon: LinearStiffness,

    /// Infinite with a rigid tendon.
    pub tendon_stiffness: LinearStiffness,

    /// Fiber (along the tendon) and tendon stiffness in series.
    pub muscle_stiffness: LinearStiffness,

    pub fiber_active_power: Power,
    pub fiber_passive_power: Power,
    pub fiber_power: Power,
    pub tendon_power: Power,
    pub muscle_power: Power,
}

/// Everything derived from one resolved state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MuscleEvaluation {
    pub length: MuscleLengthInfo,
    pub velocity: FiberVelocityInfo,
    pub dynamics: MuscleDynamicsInfo,
}

pub(super) fn evaluate<C: MuscleCurves, P: PennationModel>(
    mt: Musculotendon<'_, C, P>,
    rigid_tendon: bool,
    path: &PathKinematics,
    state: &MuscleKinematicState,
) -> Result<MuscleEvaluation, DomainError> {
    let fiso = mt.fiso();
    let lts = mt.parameters.lts();
    let path_length = path.length.get::<meter>();
    let path_velocity = path.lengthening_speed.get::<meter_per_second>();
    let length = state.fiber_length.get::<meter>();
    let velocity = state.fiber_velocity.get::<meter_per_second>();

    let fiber = mt.fiber(state.activation, length, velocity)?;
    let pennation = mt.pennation.velocity_projection(length, velocity)?;
    let velocity_along_tendon = fiber.along_tendon_derivative * velocity;
    let fiber_stiffness_along_tendon = fiber.stiffness_along_tendon();

    let (tendon_length, tendon_velocity, tendon_force, tendon_stiffness, muscle_stiffness) =
        if rigid_tendon {
            (
                lts,
                0.0,
                fiber.force_along_tendon,
                f64::INFINITY,
                fiber_stiffness_along_tendon,
            )
        } else {
            let tendon = mt.tendon_beside(path_length, &fiber);
            let series = fiber_stiffness_along_tendon + tendon.stiffness;
            let muscle_stiffness = if series == 0.0 {
                0.0
            } else {
                fiber_stiffness_along_tendon * tendon.stiffness / series
            };
            (
                tendon.length,
                path_velocity - velocity_along_tendon,
                tendon.force,
                tendon.stiffness,
                muscle_stiffness,
            )
        };

    let length_info = MuscleLengthInfo {
        fiber_length: Length::new::<meter>(length),
        fiber_length_along_tendon: Length::new::<meter>(fiber.length_along_tendon),
        normalized_fiber_length: fiber.normalized_length,
        tendon_length: Length::new::<meter>(tendon_length),
        normalized_tendon_length: tendon_length / lts,
        tendon_strain: tendon_length / lts - 1.0,
        pennation_angle: Angle::new::<radian>(pennation.angle),
    };

    let velocity_info = FiberVelocityInfo {
        fiber_velocity: Velocity::new::<meter_per_second>(velocity),
        fiber_velocity_along_tendon: Velocity::new::<meter_per_second>(velocity_along_tendon),
        normalized_fiber_velocity: fiber.normalized_velocity,
        tendon_velocity: Velocity::new::<meter_per_second>(tendon_velocity),
        pennation_angular_velocity: AngularVelocity::new::<radian_per_second>(
            pennation.angular_velocity,
        ),
    };

    let cos = fiber.cos_pennation;
    let dynamics = MuscleDynamicsInfo {
        activation: state.activation,
        active_force_length_multiplier: fiber.active_force_length,
        passive_force_length_multiplier: fiber.passive_force_length,
        force_velocity_multiplier: fiber.force_velocity,
        tendon_force_multiplier: tendon_force / fiso,
        fiber_force: Force::new::<newton>(fiber.force),
        active_fiber_force: Force::new::<newton>(fiber.active_force),
        passive_fiber_force: Force::new::<newton>(fiber.passive_force),
        fiber_force_along_tendon: Force::new::<newton>(fiber.force_along_tendon),
        active_fiber_force_along_tendon: Force::new::<newton>(fiber.active_force * cos),
        passive_fiber_force_along_tendon: Force::new::<newton>(fiber.passive_force * cos),
        tendon_force: Force::new::<newton>(tendon_force),
        fiber_stiffness: newtons_per_meter(fiber.stiffness),
        fiber_stiffness_along_tendon: newtons_per_meter(fiber_stiffness_along_tendon),
        tendon_stiffness: newtons_per_meter(tendon_stiffness),
        muscle_stiffness: newtons_per_meter(muscle_stiffness),
        fiber_active_power: Power::new::<watt>(-fiber.active_force * velocity),
        fiber_passive_power: Power::new::<watt>(-fiber.passive_force * velocity),
        fiber_power: Power::new::<watt>(-fiber.force * velocity),
        tendon_power: Power::new::<watt>(-tendon_force * tendon_velocity),
        muscle_power: Power::new::<watt>(-tendon_force * path_velocity),
    };

    Ok(MuscleEvaluation {
        length: length_info,
        velocity: velocity_info,
        dynamics,
    })
}
