use crate::support::{
    curve::MuscleCurves,
    pennation::{DomainError, PennationModel},
};

use super::{
    super::{
        Bounds,
        mechanics::{FiberPoint, Musculotendon},
    },
    EquilibriumConfig, EquilibriumError, EquilibriumInputs, EquilibriumStatus, FiberEquilibrium,
};

/// Step halvings tried before a Newton step is taken undamped.
const MAX_HALVINGS: usize = 8;

/// Consecutive non-decreasing iterations that count as divergence.
const MAX_STALLS: usize = 2;

/// Consecutive iterates projected onto the floor that count as clamping.
const MAX_PROJECTIONS: usize = 2;

/// Residuals of the reduced system at one `(l, v)` pair.
#[derive(Debug, Clone, Copy)]
struct Residuals {
    fiber: FiberPoint,
    tendon_stiffness: f64,

    /// Fiber force along the tendon minus tendon force.
    force: f64,

    /// Time derivative of `force`, assuming zero fiber acceleration.
    force_rate: f64,

    /// Normalized 2-norm.
    norm: f64,
}

struct ReducedSystem<'a, C, P> {
    mt: Musculotendon<'a, C, P>,
    inputs: &'a EquilibriumInputs,
}

impl<C: MuscleCurves, P: PennationModel> ReducedSystem<'_, C, P> {
    fn residuals(&self, length: f64, velocity: f64) -> Result<Residuals, DomainError> {
        let fiso = self.mt.fiso();
        let fiber = self.mt.fiber(self.inputs.activation, length, velocity)?;
        let tendon = self.mt.tendon_beside(self.inputs.path_length, &fiber);

        let force = fiber.force_along_tendon - tendon.force;
        let force_rate = fiber.force_along_tendon_derivative * velocity
            + fiso
                * self.inputs.activation_rate
                * fiber.active_force_length
                * fiber.force_velocity
                * fiber.cos_pennation
            - tendon.stiffness
                * (self.inputs.path_velocity - fiber.along_tendon_derivative * velocity);

        Ok(Residuals {
            fiber,
            tendon_stiffness: tendon.stiffness,
            force,
            force_rate,
            norm: force.hypot(force_rate) / fiso,
        })
    }

    /// Newton step `-J⁻¹ f`, or `None` if the Jacobian is singular.
    fn step(&self, at: &Residuals) -> Result<Option<(f64, f64)>, DomainError> {
        let mt = self.mt;
        let fiber = &at.fiber;
        let (length, velocity) = (fiber.length, fiber.velocity);
        let fiso = mt.fiso();
        let vmax = mt.parameters.max_velocity();
        let kt = at.tendon_stiffness;

        let dforce_dl = fiber.force_along_tendon_derivative + kt * fiber.along_tendon_derivative;
        let dforce_dv = mt.force_along_tendon_velocity_partial(fiber);

        let h = 1e-7 * mt.parameters.lopt();
        let ahead = self.residuals(length + h, velocity)?;
        let drate_dl = (ahead.force_rate - at.force_rate) / h;
        let drate_dv = fiber.force_along_tendon_derivative
            + velocity * mt.force_along_tendon_derivative_velocity_partial(fiber)
            + fiso
                * self.inputs.activation_rate
                * fiber.active_force_length
                * fiber.force_velocity_derivative
                * fiber.cos_pennation
                / vmax
            + kt * fiber.along_tendon_derivative;

        let det = dforce_dl * drate_dv - dforce_dv * drate_dl;
        let scale = (dforce_dl * drate_dv).abs() + (dforce_dv * drate_dl).abs();
        if !det.is_finite() || det.abs() <= f64::EPSILON * scale {
            return Ok(None);
        }

        let dl = -(drate_dv * at.force - dforce_dv * at.force_rate) / det;
        let dv = -(dforce_dl * at.force_rate - drate_dl * at.force) / det;
        Ok(Some((dl, dv)))
    }
}

/// Solves for fiber length and velocity with an elastic tendon, assuming
/// zero fiber acceleration.
///
/// Both the force balance and its time derivative are driven to zero by a
/// damped Newton iteration seeded from `seed`. Each step is halved until the
/// residual norm decreases; a step that never decreases it is taken anyway,
/// and two such steps in a row end the solve as diverged.
///
/// The fiber is clamped at its floor when the path is too short for the
/// tendon to carry load, or when two consecutive iterates land on the floor.
///
/// # Errors
///
/// Returns an [`EquilibriumError`] when the solve diverges, becomes singular
/// or exhausts its budget. A zero budget always fails.
pub(crate) fn estimate_elastic_tendon_fiber_state<C: MuscleCurves, P: PennationModel>(
    mt: Musculotendon<'_, C, P>,
    bounds: &Bounds,
    inputs: &EquilibriumInputs,
    seed: (f64, f64),
    config: &EquilibriumConfig,
) -> Result<FiberEquilibrium, EquilibriumError> {
    let system = ReducedSystem { mt, inputs };
    let (seed_length, seed_velocity) = seed;
    let mut current = system.residuals(bounds.clamp(seed_length), seed_velocity)?;

    if config.max_iterations == 0 {
        return Err(EquilibriumError::NotConverged {
            residual: current.norm,
            iterations: 0,
        });
    }

    if inputs.path_length - mt.parameters.lts() <= bounds.floor_along_tendon() {
        return clamped(&system, bounds, 0);
    }

    if current.norm < config.tolerance {
        return finish(&system, bounds, current, 0);
    }

    let mut stalls = 0;
    let mut projections = 0;

    for iteration in 1..=config.max_iterations {
        let Some((dl, dv)) = system.step(&current)? else {
            return Err(EquilibriumError::Singular {
                iterations: iteration,
            });
        };

        let mut accepted = None;
        let mut fallback = None;
        let mut scale = 1.0;
        for _ in 0..=MAX_HALVINGS {
            let unclamped = current.fiber.length + scale * dl;
            let length = bounds.clamp(unclamped);
            let velocity = current.fiber.velocity + scale * dv;
            scale *= 0.5;

            let Ok(trial) = system.residuals(length, velocity) else {
                continue;
            };
            if !trial.norm.is_finite() {
                continue;
            }

            let projected = unclamped < bounds.floor();
            if trial.norm < current.norm {
                accepted = Some((trial, projected));
                break;
            }
            if fallback.is_none() {
                fallback = Some((trial, projected));
            }
        }

        let (next, projected) = match (accepted, fallback) {
            (Some(step), _) => {
                stalls = 0;
                step
            }
            (None, Some(step)) => {
                stalls += 1;
                step
            }
            (None, None) => {
                return Err(EquilibriumError::Singular {
                    iterations: iteration,
                });
            }
        };

        if stalls >= MAX_STALLS {
            return Err(EquilibriumError::NotConverged {
                residual: next.norm,
                iterations: iteration,
            });
        }

        projections = if projected { projections + 1 } else { 0 };
        if projections >= MAX_PROJECTIONS {
            return clamped(&system, bounds, iteration);
        }

        current = next;
        if current.norm < config.tolerance {
            return finish(&system, bounds, current, iteration);
        }
    }

    Err(EquilibriumError::NotConverged {
        residual: current.norm,
        iterations: config.max_iterations,
    })
}

fn finish<C: MuscleCurves, P: PennationModel>(
    system: &ReducedSystem<'_, C, P>,
    bounds: &Bounds,
    at: Residuals,
    iterations: usize,
) -> Result<FiberEquilibrium, EquilibriumError> {
    if bounds.is_fiber_state_clamped(at.fiber.length, at.fiber.velocity) {
        return clamped(system, bounds, iterations);
    }
    Ok(FiberEquilibrium::new(
        at.fiber.length,
        at.fiber.velocity,
        EquilibriumStatus::Converged,
        at.norm,
        iterations,
    ))
}

/// Holds the fiber at its floor with the velocity that balances force there,
/// made non-negative.
fn clamped<C: MuscleCurves, P: PennationModel>(
    system: &ReducedSystem<'_, C, P>,
    bounds: &Bounds,
    iterations: usize,
) -> Result<FiberEquilibrium, EquilibriumError> {
    let inputs = system.inputs;
    let length = bounds.floor();
    let velocity = system
        .mt
        .balancing_velocity(inputs.activation, length, inputs.path_length)?
        .max(0.0);
    let at = system.residuals(length, velocity)?;

    Ok(FiberEquilibrium::new(
        length,
        velocity,
        EquilibriumStatus::ClampedAtMinimumLength,
        at.force.abs() / system.mt.fiso(),
        iterations,
    ))
}
