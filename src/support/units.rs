//! Extensions to [`uom`].
//!
//! This crate uses [`uom`] for all physical quantities at its public surface
//! (lengths, velocities, forces, powers, angles).
//! This module provides quantities that are useful for muscle modeling but
//! aren't included in [`uom`].
//!
//! ## Linear stiffness
//!
//! Fiber and tendon stiffness are forces per unit length (N/m).
//! [`uom`] has no named quantity for that dimension, so [`LinearStiffness`]
//! is defined here and is produced naturally by dividing a force by a length:
//!
//! ```
//! use twine_muscle::support::units::LinearStiffness;
//! use uom::si::{f64::{Force, Length}, force::newton, length::meter};
//!
//! let k: LinearStiffness = Force::new::<newton>(500.0) / Length::new::<meter>(0.01);
//! assert_eq!(k.value, 50_000.0);
//! ```

use uom::{
    si::{
        ISQ, Quantity, SI,
        f64::{Force, Length},
        force::newton,
        length::meter,
    },
    typenum::{N2, P1, Z0},
};

/// Linear stiffness, N/m in SI.
pub type LinearStiffness = Quantity<ISQ<Z0, P1, N2, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Constructs a [`LinearStiffness`] from a value in newtons per meter.
#[must_use]
pub fn newtons_per_meter(value: f64) -> LinearStiffness {
    Force::new::<newton>(value) / Length::new::<meter>(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::{force::kilonewton, length::centimeter};

    #[test]
    fn stiffness_from_force_over_length() {
        let k: LinearStiffness = Force::new::<kilonewton>(2.0) / Length::new::<centimeter>(1.0);
        assert_relative_eq!(k.value, 200_000.0);
        assert_relative_eq!(newtons_per_meter(200_000.0).value, k.value);
    }

    #[test]
    fn infinite_stiffness_is_representable() {
        assert!(newtons_per_meter(f64::INFINITY).value.is_infinite());
    }
}
