//! Build script for pld-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates machine.toml against the core config types

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use pld_core::config::{ConfigError, MachineConfig};

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").expect("OUT_DIR is set by cargo"));

    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).expect("create memory.x in OUT_DIR");
    f.write_all(memory_x).expect("write memory.x");

    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate machine.toml at compile time
///
/// The firmware parses the same file with its own alloc-free reader, so
/// anything rejected here would otherwise only show up as a fallback to
/// defaults on the target.
fn validate_config() {
    println!("cargo:rerun-if-changed=machine.toml");

    let config_path = Path::new("machine.toml");
    if !config_path.exists() {
        fail(
            "machine.toml not found",
            &["The firmware embeds machine.toml from the pld-firmware directory."],
        );
    }

    let content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => fail("Failed to read machine.toml", &[&e.to_string()]),
    };

    let config: MachineConfig = match toml::from_str(&content) {
        Ok(config) => config,
        Err(e) => {
            let msg = e.to_string();
            let lines: Vec<&str> = msg.lines().collect();
            fail("Invalid machine.toml", &lines);
        }
    };

    if let Err(e) = config.validate() {
        fail("Invalid machine configuration", &[describe(e)]);
    }

    println!("cargo:warning=machine.toml validated successfully");
}

fn describe(error: ConfigError) -> &'static str {
    match error {
        ConfigError::InvalidMaxSpeed => "[motion] max_speed must be a positive number",
        ConfigError::InvalidAcceleration => "[motion] acceleration must be a positive number",
        ConfigError::InvalidTolerance => "[motion] stop_tolerance must be a positive number",
        ConfigError::InvalidTeachDistance => "[teach] clear_steps and search_steps must be non-zero",
        ConfigError::InvalidPulseWidth => "[laser] pulse_width_ms must be non-zero",
        ConfigError::PositionOutOfRange => "saved_positions must all be below 1600",
    }
}

/// Abort the build with a boxed error message
fn fail(title: &str, details: &[&str]) -> ! {
    let body = details
        .iter()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n");

    panic!(
        "\n\
        ╔══════════════════════════════════════════════════════════════════╗\n\
        ║  ERROR: {:<58} ║\n\
        ╠══════════════════════════════════════════════════════════════════╣\n\
        {}\n\
        ╚══════════════════════════════════════════════════════════════════╝\n",
        title, body
    );
}
