//! Biomechanics models.
//!
//! This module contains models of the musculoskeletal system that plug into
//! a multibody simulation, starting with Hill-type musculotendon actuators.

pub mod muscle;
