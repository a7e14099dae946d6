//! Hardware abstraction traits
//!
//! These traits define the interface between the control logic and the
//! board-specific implementations in `pld-drivers`.

pub mod laser;
pub mod motion;
pub mod sensor;

pub use laser::{LaserIo, LaserLine};
pub use motion::MotionPrimitive;
pub use sensor::HomingSensor;
