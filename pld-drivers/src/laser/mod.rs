//! Laser output implementations

pub mod outputs;

pub use outputs::LaserOutputs;
