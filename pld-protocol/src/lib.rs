//! Text command protocol for the laser positioning controller
//!
//! The host talks to the controller over a serial line using one command
//! per line:
//!
//! ```text
//! CMD:GOTO:400\n      ->  Moving to 400 (400 steps)
//!                         OK:GOTO
//! CMD:LASER_p10f5\n   ->  Starting laser sequence: 10 pulses @ 5.0 Hz
//! ```
//!
//! This crate only deals with text: assembling lines from bytes, parsing
//! them into [`Command`]s and rendering [`Reply`] lines. It knows nothing
//! about the machine that executes them.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod line;
pub mod reply;

pub use command::{Command, LaserCommand, ParseError, COMMAND_PREFIX};
pub use line::{Line, LineError, LineParser, MAX_LINE_LEN};
pub use reply::{LaserLine, MoveKind, Rejection, Reply, SLOT_COUNT};
