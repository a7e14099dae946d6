//! Hardware driver implementations
//!
//! Concrete implementations of the capability traits in `pld-core` over
//! `embedded-hal` 1.0 digital pins:
//!
//! - Step/dir stepper with a constant-acceleration ramp
//! - Light-gate homing sensor
//! - Laser output bank (pulse, power relay, speaker)
//!
//! Pin errors are discarded: the traits these implement are infallible and
//! on-chip GPIO cannot fail.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod laser;
pub mod sensor;
pub mod stepper;
