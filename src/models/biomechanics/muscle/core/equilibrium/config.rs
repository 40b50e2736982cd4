use twine_solvers::equation::bisection;

/// Convergence settings for a fiber equilibrium solve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EquilibriumConfig {
    /// Tolerance on the residual, normalized by max isometric force.
    pub tolerance: f64,

    /// Iteration budget. Exhausting it is a convergence failure.
    pub max_iterations: usize,
}

impl Default for EquilibriumConfig {
    fn default() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 200,
        }
    }
}

impl EquilibriumConfig {
    /// Settings for the per-evaluation reduced-dynamics solve.
    #[must_use]
    pub fn reduced() -> Self {
        Self {
            tolerance: 1e-8,
            max_iterations: 50,
        }
    }

    /// Converts the remaining budget into a bisection solver configuration.
    pub(super) fn bisection(&self, max_iters: usize) -> bisection::Config {
        bisection::Config {
            max_iters,
            x_abs_tol: 1e-12,
            x_rel_tol: 0.0,
            residual_tol: self.tolerance,
        }
    }
}
