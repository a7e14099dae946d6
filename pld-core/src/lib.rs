//! Board-agnostic control logic for the PLD rotary stage and laser controller
//!
//! This crate contains everything that does not touch real hardware:
//!
//! - Capability traits (motion primitive, homing sensor, laser outputs)
//! - Circular position model and the stepper coordinator
//! - Non-blocking laser pulse sequencer with alarm and self-test
//! - System state machine driving the homing ("teach") procedure
//! - Command dispatch and the cooperative control pass ([`Controller`])
//! - Configuration type definitions

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod admission;
pub mod config;
pub mod controller;
pub mod laser;
pub mod motion;
pub mod outbox;
pub mod state;
pub mod traits;

#[cfg(test)]
mod testing;

pub use controller::Controller;
