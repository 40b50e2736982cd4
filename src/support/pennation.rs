//! Pennation geometry: relating fiber kinematics to the tendon direction.
//!
//! Muscle fibers are inclined to the line of action of the tendon by the
//! pennation angle. A [`PennationModel`] converts fiber length and velocity
//! into their projections along the tendon and reports the pennation angle
//! and its rate.
//!
//! Models declare a minimum fiber length. Shorter fibers would push the
//! pennation angle to or past its ceiling, so they are refused with a
//! [`DomainError`] rather than silently producing a degenerate geometry.
//! Callers are expected to clamp fiber length before asking.
//!
//! All quantities are SI scalars (meters, meters per second, radians).

mod fixed_width;

pub use fixed_width::FixedWidthPennation;

use thiserror::Error;

use crate::support::constraint::ConstraintResult;

/// A collaborator received an input outside its declared domain.
///
/// This always indicates a violated invariant upstream (for example a fiber
/// length that skipped clamping), never a numerical near-miss.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[non_exhaustive]
pub enum DomainError {
    /// The fiber length is shorter than the geometric floor.
    #[error("fiber length {fiber_length} m is below the minimum {minimum} m")]
    BelowMinimumFiberLength { fiber_length: f64, minimum: f64 },

    /// The input is NaN or infinite.
    #[error("non-finite input: {value}")]
    NonFinite { value: f64 },
}

/// Pennation angle and its rate of change.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pennation {
    /// Angle between fiber and tendon, in radians.
    pub angle: f64,

    /// Rate of change of the pennation angle, in radians per second.
    pub angular_velocity: f64,
}

/// Pennation geometry capability.
pub trait PennationModel {
    /// Shortest fiber length the geometry accepts.
    fn minimum_fiber_length(&self) -> f64;

    /// Ceiling on the pennation angle.
    fn maximum_pennation_angle(&self) -> f64;

    /// Sets the ceiling on the pennation angle and recomputes the fiber length floor.
    ///
    /// # Errors
    ///
    /// Returns an error if the angle is outside the range the geometry supports.
    fn set_maximum_pennation_angle(&mut self, angle: f64) -> ConstraintResult<()>;

    /// Pennation angle of a fiber of the given length.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the length is below the floor or not finite.
    fn pennation_angle(&self, fiber_length: f64) -> Result<f64, DomainError>;

    /// Partial derivative of the pennation angle with respect to fiber length.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the length is below the floor or not finite.
    fn pennation_angle_derivative(&self, fiber_length: f64) -> Result<f64, DomainError>;

    /// Fiber length that projects onto the given length along the tendon.
    fn fiber_length(&self, length_along_tendon: f64) -> f64;

    /// Projection of the fiber length onto the tendon.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the length is below the floor or not finite.
    fn fiber_length_along_tendon(&self, fiber_length: f64) -> Result<f64, DomainError> {
        Ok(fiber_length * self.pennation_angle(fiber_length)?.cos())
    }

    /// Pennation angle and its rate for a fiber moving at `fiber_velocity`.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the length is below the floor or not finite.
    fn velocity_projection(
        &self,
        fiber_length: f64,
        fiber_velocity: f64,
    ) -> Result<Pennation, DomainError> {
        Ok(Pennation {
            angle: self.pennation_angle(fiber_length)?,
            angular_velocity: self.pennation_angle_derivative(fiber_length)? * fiber_velocity,
        })
    }

    /// Partial derivative of the along-tendon fiber length with respect to fiber length.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the length is below the floor or not finite.
    fn along_tendon_derivative(&self, fiber_length: f64) -> Result<f64, DomainError> {
        let phi = self.pennation_angle(fiber_length)?;
        let dphi = self.pennation_angle_derivative(fiber_length)?;
        Ok(phi.cos() - fiber_length * phi.sin() * dphi)
    }

    /// Projection of the fiber velocity onto the tendon.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] if the length is below the floor or not finite.
    fn fiber_velocity_along_tendon(
        &self,
        fiber_length: f64,
        fiber_velocity: f64,
    ) -> Result<f64, DomainError> {
        Ok(self.along_tendon_derivative(fiber_length)? * fiber_velocity)
    }
}
