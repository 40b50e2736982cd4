use tracing::debug;
use twine_solvers::equation::bisection;

use crate::support::{curve::MuscleCurves, pennation::PennationModel};

use super::{
    super::{Bounds, mechanics::Musculotendon},
    EquilibriumConfig, EquilibriumError, EquilibriumInputs, EquilibriumStatus, FiberEquilibrium,
    problem::{InitialEquilibriumModel, InitialEquilibriumProblem, InitialPoint, initial_point},
};

/// Fiber state with a rigid tendon, in closed form.
///
/// The tendon stays at its slack length, so the fiber takes the rest of the
/// path and all of its lengthening speed.
pub(crate) fn rigid_equilibrium<C: MuscleCurves, P: PennationModel>(
    mt: Musculotendon<'_, C, P>,
    bounds: &Bounds,
    inputs: &EquilibriumInputs,
) -> Result<FiberEquilibrium, EquilibriumError> {
    let along_tendon = (inputs.path_length - mt.parameters.lts()).max(0.0);
    let unclamped = mt.pennation.fiber_length(along_tendon);
    let length = bounds.clamp(unclamped);
    let velocity = inputs.path_velocity / mt.pennation.along_tendon_derivative(length)?;

    if unclamped < bounds.floor() || bounds.is_fiber_state_clamped(length, velocity) {
        return Ok(FiberEquilibrium::new(
            length,
            velocity.max(0.0),
            EquilibriumStatus::ClampedAtMinimumLength,
            0.0,
            0,
        ));
    }

    Ok(FiberEquilibrium::new(
        length,
        velocity,
        EquilibriumStatus::Converged,
        0.0,
        0,
    ))
}

/// Fiber state with an elastic tendon, by Newton iteration over fiber length.
///
/// Starts with the tendon at its slack length. If the slope of the residual
/// stops being usable the remaining budget goes to a bisection solve between
/// the fiber floor and that starting length.
///
/// # Errors
///
/// Returns [`EquilibriumError::NotConverged`] when the budget runs out.
pub(crate) fn elastic_initial_equilibrium<C: MuscleCurves, P: PennationModel>(
    mt: Musculotendon<'_, C, P>,
    bounds: &Bounds,
    inputs: &EquilibriumInputs,
    config: &EquilibriumConfig,
) -> Result<FiberEquilibrium, EquilibriumError> {
    let fiso = mt.fiso();

    // Fiber force exceeds tendon force even at the floor.
    let at_floor = initial_point(mt, inputs, bounds.floor())?;
    if at_floor.residual >= 0.0 {
        return Ok(FiberEquilibrium::new(
            bounds.floor(),
            at_floor.fiber.velocity.max(0.0),
            EquilibriumStatus::ClampedAtMinimumLength,
            at_floor.residual / fiso,
            0,
        ));
    }

    let slack_length = bounds.clamp(
        mt.pennation
            .fiber_length((inputs.path_length - mt.parameters.lts()).max(0.0)),
    );
    let min_slope = f64::EPSILON.sqrt() * fiso / mt.parameters.lopt();

    let mut point = initial_point(mt, inputs, slack_length)?;
    for iteration in 0..config.max_iterations {
        if (point.residual / fiso).abs() < config.tolerance {
            return Ok(converged(&point, fiso, iteration));
        }

        if !(point.slope.is_finite() && point.slope > min_slope) {
            debug!(
                iterations = iteration,
                slope = point.slope,
                "initial equilibrium slope unusable, bracketing"
            );
            return bracket(mt, bounds, inputs, config, iteration, slack_length);
        }

        let length = bounds.clamp(point.fiber.length - point.residual / point.slope);
        point = initial_point(mt, inputs, length)?;
    }

    if (point.residual / fiso).abs() < config.tolerance {
        return Ok(converged(&point, fiso, config.max_iterations));
    }

    Err(EquilibriumError::NotConverged {
        residual: point.residual / fiso,
        iterations: config.max_iterations,
    })
}

fn converged(point: &InitialPoint, fiso: f64, iterations: usize) -> FiberEquilibrium {
    FiberEquilibrium::new(
        point.fiber.length,
        point.fiber.velocity,
        EquilibriumStatus::Converged,
        point.residual / fiso,
        iterations,
    )
}

fn bracket<C: MuscleCurves, P: PennationModel>(
    mt: Musculotendon<'_, C, P>,
    bounds: &Bounds,
    inputs: &EquilibriumInputs,
    config: &EquilibriumConfig,
    used: usize,
    upper: f64,
) -> Result<FiberEquilibrium, EquilibriumError> {
    let fiso = mt.fiso();
    let model = InitialEquilibriumModel::new(mt, *inputs);
    let problem = InitialEquilibriumProblem::new(fiso);

    let solution = bisection::solve(
        &model,
        &problem,
        [bounds.floor(), upper],
        &config.bisection(config.max_iterations - used),
        |_event: &bisection::Event<'_, _, _>| None,
    )?;

    if solution.status != bisection::Status::Converged {
        return Err(EquilibriumError::NotConverged {
            residual: solution.residual,
            iterations: used + solution.iters,
        });
    }

    Ok(converged(&solution.snapshot.output, fiso, used + solution.iters))
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use super::super::super::{
        classify,
        test_support::{self, meters, meters_per_second},
    };

    fn inputs(path_length: f64, path_velocity: f64, activation: f64) -> EquilibriumInputs {
        EquilibriumInputs {
            path_length,
            path_velocity,
            activation,
            activation_rate: 0.0,
        }
    }

    #[test]
    fn rigid_tendon_at_optimal_path() {
        let fixture = test_support::Fixture::new(classify(false, true, false).unwrap());
        let params = fixture.parameters;

        let equilibrium = rigid_equilibrium(
            fixture.mt(),
            &fixture.bounds,
            &inputs(test_support::optimal_path_length(), 0.0, 1.0),
        )
        .unwrap();

        assert_eq!(equilibrium.status, EquilibriumStatus::Converged);
        assert_relative_eq!(meters(equilibrium.fiber_length), params.lopt(), epsilon = 1e-12);
        let fiber = fixture
            .mt()
            .fiber(1.0, params.lopt(), 0.0)
            .unwrap();
        assert_relative_eq!(fiber.force, params.fiso(), epsilon = 1e-9);
    }

    #[test]
    fn rigid_tendon_clamps_short_paths() {
        let fixture = test_support::Fixture::new(classify(false, true, false).unwrap());
        let short = fixture.parameters.lts() + 0.1 * fixture.bounds.floor_along_tendon();

        let equilibrium =
            rigid_equilibrium(fixture.mt(), &fixture.bounds, &inputs(short, -0.5, 1.0)).unwrap();

        assert_eq!(equilibrium.status, EquilibriumStatus::ClampedAtMinimumLength);
        assert_relative_eq!(meters(equilibrium.fiber_length), fixture.bounds.floor());
        assert_relative_eq!(meters_per_second(equilibrium.fiber_velocity), 0.0);
    }

    #[test]
    fn elastic_residual_within_tolerance() {
        let fixture = test_support::Fixture::new(classify(true, true, false).unwrap());
        let config = EquilibriumConfig::default();
        let inputs = inputs(test_support::optimal_path_length() + 0.003, 0.0, 0.8);

        let equilibrium =
            elastic_initial_equilibrium(fixture.mt(), &fixture.bounds, &inputs, &config).unwrap();
        assert_eq!(equilibrium.status, EquilibriumStatus::Converged);

        let mt = fixture.mt();
        let fiber = mt
            .fiber(0.8, meters(equilibrium.fiber_length), 0.0)
            .unwrap();
        let tendon = mt.tendon_beside(inputs.path_length, &fiber);
        assert!((fiber.force_along_tendon - tendon.force).abs() <= config.tolerance * mt.fiso());
    }

    #[test]
    fn elastic_shares_path_speed_by_stiffness() {
        let fixture = test_support::Fixture::new(classify(true, true, false).unwrap());
        let inputs = inputs(test_support::optimal_path_length() + 0.003, 0.05, 1.0);

        let equilibrium = elastic_initial_equilibrium(
            fixture.mt(),
            &fixture.bounds,
            &inputs,
            &EquilibriumConfig::default(),
        )
        .unwrap();

        let velocity = meters_per_second(equilibrium.fiber_velocity);
        assert!(velocity > 0.0);
        assert!(velocity < inputs.path_velocity);
    }

    #[test]
    fn elastic_clamps_when_path_is_too_short() {
        let fixture = test_support::Fixture::new(classify(true, true, false).unwrap());
        let short = fixture.parameters.lts() + 0.5 * fixture.bounds.floor_along_tendon();

        let equilibrium = elastic_initial_equilibrium(
            fixture.mt(),
            &fixture.bounds,
            &inputs(short, 0.0, 0.5),
            &EquilibriumConfig::default(),
        )
        .unwrap();

        assert!(equilibrium.is_clamped());
        assert_relative_eq!(meters(equilibrium.fiber_length), fixture.bounds.floor());
    }

    #[test]
    fn negative_slope_falls_back_to_bracketing() {
        // Starting on the descending limb with a slack tendon, the residual
        // slope is negative and Newton cannot be trusted.
        let fixture = test_support::Fixture::new(classify(true, true, false).unwrap());
        let along_tendon = fixture
            .pennation
            .fiber_length_along_tendon(1.2 * fixture.parameters.lopt())
            .unwrap();
        let path = fixture.parameters.lts() + along_tendon;

        let equilibrium = elastic_initial_equilibrium(
            fixture.mt(),
            &fixture.bounds,
            &inputs(path, 0.0, 1.0),
            &EquilibriumConfig::default(),
        )
        .unwrap();

        assert_eq!(equilibrium.status, EquilibriumStatus::Converged);
        assert!(equilibrium.residual.abs() < 1e-8);
    }

    #[test]
    fn zero_budget_fails() {
        let fixture = test_support::Fixture::new(classify(true, true, false).unwrap());
        let config = EquilibriumConfig {
            max_iterations: 0,
            ..EquilibriumConfig::default()
        };

        let result = elastic_initial_equilibrium(
            fixture.mt(),
            &fixture.bounds,
            &inputs(test_support::optimal_path_length() + 0.003, 0.0, 1.0),
            &config,
        );
        assert!(matches!(
            result,
            Err(EquilibriumError::NotConverged { iterations: 0, .. })
        ));
    }
}
