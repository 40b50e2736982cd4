//! Characteristic curves of a Hill-type musculotendon actuator.
//!
//! An equilibrium muscle is driven by four dimensionless curves:
//!
//! - **Active force-length**: force multiplier of the contractile element as a
//!   function of normalized fiber length (bell shaped, peak of 1 at optimal length).
//! - **Force-velocity**: force multiplier as a function of normalized fiber
//!   velocity (negative is shortening), together with its inverse.
//! - **Fiber force-length**: passive force multiplier of the fiber as a function
//!   of normalized fiber length.
//! - **Tendon force-length**: tendon force multiplier as a function of
//!   normalized tendon length (tendon length over slack length).
//!
//! Each curve is a capability trait built on [`Curve`], so alternative shapes
//! can be substituted without touching the solvers.
//! The [`MuscleCurves`] trait bundles one of each, and [`CurveSet`] is the
//! ready-made bundle, defaulting to the reference curves in this module.
//!
//! # Example
//!
//! ```
//! use twine_muscle::support::curve::{Curve, CurveSet, ForceVelocityCurve, MuscleCurves};
//!
//! let curves = <CurveSet>::default();
//! let fv = curves.force_velocity();
//!
//! // Isometric fibers produce their full force.
//! assert!((fv.value(0.0) - 1.0).abs() < 1e-12);
//!
//! // The inverse undoes the curve.
//! let v = fv.inverse(fv.value(-0.3));
//! assert!((v + 0.3).abs() < 1e-12);
//! ```

mod active_force_length;
mod fiber_force_length;
mod force_velocity;
mod tendon_force_length;

pub use active_force_length::ActiveForceLength;
pub use fiber_force_length::FiberForceLength;
pub use force_velocity::ForceVelocity;
pub use tendon_force_length::TendonForceLength;

/// A pure scalar curve with an analytic first derivative.
pub trait Curve {
    /// Evaluates the curve at `x`.
    fn value(&self, x: f64) -> f64;

    /// Evaluates the first derivative of the curve at `x`.
    fn derivative(&self, x: f64) -> f64;
}

/// Active force-length capability.
pub trait ActiveForceLengthCurve: Curve {
    /// Shortest normalized fiber length at which the fiber may operate.
    fn minimum_active_fiber_length(&self) -> f64;

    /// Smallest value the curve takes over its operating range.
    ///
    /// A zero minimum makes the inverted force-velocity relation singular and
    /// is only acceptable when fiber length is not integrated.
    fn minimum_value(&self) -> f64;
}

/// Force-velocity capability.
///
/// Implementations must be strictly monotonic over the whole real line so the
/// inverse is total.
pub trait ForceVelocityCurve: Curve {
    /// Returns the normalized fiber velocity producing `force_multiplier`.
    fn inverse(&self, force_multiplier: f64) -> f64;
}

/// A complete set of muscle characteristic curves.
pub trait MuscleCurves {
    type ActiveForceLength: ActiveForceLengthCurve;
    type ForceVelocity: ForceVelocityCurve;
    type FiberForceLength: Curve;
    type TendonForceLength: Curve;

    fn active_force_length(&self) -> &Self::ActiveForceLength;
    fn force_velocity(&self) -> &Self::ForceVelocity;
    fn fiber_force_length(&self) -> &Self::FiberForceLength;
    fn tendon_force_length(&self) -> &Self::TendonForceLength;
}

/// A concrete bundle of the four muscle curves.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CurveSet<
    A = ActiveForceLength,
    V = ForceVelocity,
    P = FiberForceLength,
    T = TendonForceLength,
> {
    pub active_force_length: A,
    pub force_velocity: V,
    pub fiber_force_length: P,
    pub tendon_force_length: T,
}

impl<A, V, P, T> MuscleCurves for CurveSet<A, V, P, T>
where
    A: ActiveForceLengthCurve,
    V: ForceVelocityCurve,
    P: Curve,
    T: Curve,
{
    type ActiveForceLength = A;
    type ForceVelocity = V;
    type FiberForceLength = P;
    type TendonForceLength = T;

    fn active_force_length(&self) -> &A {
        &self.active_force_length
    }

    fn force_velocity(&self) -> &V {
        &self.force_velocity
    }

    fn fiber_force_length(&self) -> &P {
        &self.fiber_force_length
    }

    fn tendon_force_length(&self) -> &T {
        &self.tendon_force_length
    }
}

/// Central-difference check of an analytic derivative, shared by curve tests.
#[cfg(test)]
pub(crate) fn assert_derivative_matches(curve: &impl Curve, x: f64) {
    let h = 1e-6;
    let numeric = (curve.value(x + h) - curve.value(x - h)) / (2.0 * h);
    approx::assert_relative_eq!(curve.derivative(x), numeric, epsilon = 1e-5, max_relative = 1e-5);
}
