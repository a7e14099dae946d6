//! Motion on the circular axis
//!
//! Position normalization, forward-only targeting, duration estimates and
//! the coordinator that ties them to a motion primitive.

pub mod coordinator;
pub mod planner;
pub mod position;

pub use coordinator::{MoveGuard, MoveStart, StepperCoordinator};
pub use planner::TrapezoidProfile;
pub use position::{forward_steps, normalize, MoveIntent, SavedPositions, MAX_STEP};
