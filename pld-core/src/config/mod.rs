//! Configuration types
//!
//! Board-agnostic configuration structures. The firmware fills these from
//! the embedded `machine.toml`; everything has a default matching the
//! stock rig.

pub mod types;

pub use types::*;
