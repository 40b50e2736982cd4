use uom::si::{
    angle::radian,
    f64::{Angle, Force, Length, Velocity},
    force::newton,
    length::meter,
    velocity::meter_per_second,
};

use crate::support::{
    activation::FirstOrderActivation,
    constraint::{NonNegative, StrictlyPositive},
    curve::CurveSet,
    pennation::FixedWidthPennation,
};

use super::{
    Bounds, EquilibriumMuscle, MuscleConfiguration, PathKinematics, SimulationMode,
    mechanics::Musculotendon, parameters::MuscleParameters,
};

/// Pennation angle at optimal fiber length used by the fixtures, in radians.
pub(super) const PENNATION: f64 = 0.2;

pub(super) fn parameters() -> MuscleParameters {
    MuscleParameters::new(
        StrictlyPositive::new(Force::new::<newton>(1000.0)).unwrap(),
        StrictlyPositive::new(Length::new::<meter>(0.1)).unwrap(),
        StrictlyPositive::new(Length::new::<meter>(0.2)).unwrap(),
        NonNegative::new(Angle::new::<radian>(PENNATION)).unwrap(),
    )
}

pub(super) fn pennation() -> FixedWidthPennation {
    FixedWidthPennation::new(Length::new::<meter>(0.1), Angle::new::<radian>(PENNATION)).unwrap()
}

/// Path length that puts the fiber at optimal length with a slack tendon.
pub(super) fn optimal_path_length() -> f64 {
    0.1 * PENNATION.cos() + 0.2
}

pub(super) fn path(length: f64, lengthening_speed: f64) -> PathKinematics {
    PathKinematics {
        length: Length::new::<meter>(length),
        lengthening_speed: Velocity::new::<meter_per_second>(lengthening_speed),
    }
}

pub(super) fn muscle(configuration: MuscleConfiguration) -> EquilibriumMuscle {
    EquilibriumMuscle::new("soleus", parameters(), configuration).unwrap()
}

pub(super) fn meters(length: Length) -> f64 {
    length.get::<meter>()
}

pub(super) fn meters_per_second(velocity: Velocity) -> f64 {
    velocity.get::<meter_per_second>()
}

/// Reference collaborators and their bounds for a mode.
pub(super) struct Fixture {
    pub(super) parameters: MuscleParameters,
    pub(super) curves: CurveSet,
    pub(super) pennation: FixedWidthPennation,
    pub(super) bounds: Bounds,
}

impl Fixture {
    pub(super) fn new(mode: SimulationMode) -> Self {
        let parameters = parameters();
        let curves = <CurveSet>::default();
        let pennation = pennation();
        let bounds = Bounds::compute(
            mode,
            &parameters,
            &curves,
            &pennation,
            &FirstOrderActivation::default(),
        )
        .unwrap();

        Self {
            parameters,
            curves,
            pennation,
            bounds,
        }
    }

    pub(super) fn mt(&self) -> Musculotendon<'_, CurveSet, FixedWidthPennation> {
        Musculotendon {
            parameters: &self.parameters,
            curves: &self.curves,
            pennation: &self.pennation,
        }
    }
}
