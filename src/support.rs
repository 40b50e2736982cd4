//! Supporting utilities used by models.
//!
//! Everything here is public because it's useful on its own (for example to
//! build alternative muscle curves or pennation geometries), but the APIs are
//! not stable.

pub mod activation;
pub mod constraint;
pub mod curve;
pub mod pennation;
pub mod units;
