use thiserror::Error;

use crate::support::{constraint::ConstraintError, pennation::DomainError};

use super::{ConfigurationError, EquilibriumError};

/// A muscle operation failed.
///
/// Every variant names the muscle instance so a failure inside a large model
/// can be traced to its source.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MuscleError {
    /// Invalid configuration or a configuration change after finalization.
    #[error("muscle '{muscle}': {source}")]
    Configuration {
        muscle: String,
        source: ConfigurationError,
    },

    /// A parameter or collaborator setting violated its constraint.
    #[error("muscle '{muscle}': {source}")]
    Parameter {
        muscle: String,
        source: ConstraintError,
    },

    /// The fiber equilibrium solve failed.
    #[error("muscle '{muscle}': {source}")]
    Equilibrium {
        muscle: String,
        source: EquilibriumError,
    },

    /// A collaborator was handed an input outside its domain.
    #[error("muscle '{muscle}': {source}")]
    Domain { muscle: String, source: DomainError },
}

impl MuscleError {
    pub(super) fn configuration(muscle: &str, source: ConfigurationError) -> Self {
        Self::Configuration {
            muscle: muscle.to_owned(),
            source,
        }
    }

    pub(super) fn parameter(muscle: &str, source: ConstraintError) -> Self {
        Self::Parameter {
            muscle: muscle.to_owned(),
            source,
        }
    }

    pub(super) fn equilibrium(muscle: &str, source: EquilibriumError) -> Self {
        match source {
            EquilibriumError::Domain(source) => Self::domain(muscle, source),
            source => Self::Equilibrium {
                muscle: muscle.to_owned(),
                source,
            },
        }
    }

    pub(super) fn domain(muscle: &str, source: DomainError) -> Self {
        Self::Domain {
            muscle: muscle.to_owned(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_names_the_muscle_and_bound() {
        let error = MuscleError::domain(
            "soleus",
            DomainError::BelowMinimumFiberLength {
                fiber_length: 0.01,
                minimum: 0.02,
            },
        );
        let message = error.to_string();
        assert!(message.contains("soleus"));
        assert!(message.contains("0.02"));
    }

    #[test]
    fn domain_failures_inside_solves_stay_domain_failures() {
        let error = MuscleError::equilibrium(
            "soleus",
            EquilibriumError::Domain(DomainError::NonFinite { value: f64::NAN }),
        );
        assert!(matches!(error, MuscleError::Domain { .. }));
    }
}
