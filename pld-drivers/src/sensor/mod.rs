//! Homing sensor implementations

pub mod light_gate;

pub use light_gate::LightGate;
