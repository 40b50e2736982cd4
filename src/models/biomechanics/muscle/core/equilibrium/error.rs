use thiserror::Error;
use twine_solvers::equation::bisection;

use crate::support::pennation::DomainError;

/// A fiber equilibrium solve failed.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EquilibriumError {
    /// The residual did not meet the tolerance, either because the iteration
    /// budget ran out or because the residual stopped decreasing.
    #[error("fiber equilibrium did not converge in {iterations} iterations: residual={residual}")]
    NotConverged {
        /// Last residual norm, normalized by max isometric force.
        residual: f64,
        iterations: usize,
    },

    /// The Newton system became singular or produced non-finite values.
    #[error("fiber equilibrium became singular after {iterations} iterations")]
    Singular { iterations: usize },

    /// The bracketing fallback failed.
    #[error("bisection solver error")]
    Bisection(#[from] bisection::Error),

    /// A collaborator was handed an input outside its domain.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
