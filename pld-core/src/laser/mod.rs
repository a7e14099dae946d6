//! Laser firing subsystem
//!
//! Pulse sequencing, the pre-fire alarm, the power interlock and the output
//! self-test.

pub mod alarm;
pub mod sequencer;

pub use alarm::Alarm;
pub use self_test::{SelfTest, SELF_TEST_MS};
pub use sequencer::{LaserSequencer, PulsePlan, PROGRESS_INTERVAL};
