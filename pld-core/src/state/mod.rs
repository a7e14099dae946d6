//! System state machine
//!
//! The authoritative execution phase. Gates which commands are admitted,
//! drives the homing procedure and is where motion and laser completion are
//! observed.

pub mod debounce;
pub mod events;
pub mod machine;

pub use debounce::Debounce;
pub use events::Event;
pub use machine::{Action, Observations, SystemState};
