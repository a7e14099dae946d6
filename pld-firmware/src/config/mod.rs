//! Configuration loading
//!
//! The machine configuration is compiled in from machine.toml and parsed
//! at boot by an alloc-free reader.

pub mod toml;

pub use toml::{parse_config, ParseError};
