//! Minimal TOML reader for machine.toml
//!
//! Handles only the subset machine.toml uses and needs no allocator:
//! - `key = value` pairs (integer, float)
//! - `[section]` and `[section.subsection]` headers
//! - single-line integer arrays
//! - comments (`# ...`), including trailing ones
//!
//! Multi-line arrays, strings, inline tables and dotted keys are not
//! supported. build.rs checks the same file with the full `toml` crate.

use heapless::String;

use pld_core::config::{ConfigError, MachineConfig};
use pld_protocol::SLOT_COUNT;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Key not known in its section
    UnknownKey,
    /// Value could not be parsed as the expected type
    InvalidValue,
    /// Array has the wrong number of entries
    WrongLength,
    /// Parsed fine but the values are unusable
    Invalid(ConfigError),
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Motion,
    Teach,
    Laser,
    Alarm,
}

/// Parse machine.toml into a validated [`MachineConfig`]
///
/// Keys that are absent keep their default.
pub fn parse_config(input: &str) -> Result<MachineConfig, ParseError> {
    let mut config = MachineConfig::default();
    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidValue)?;
        apply_value(&mut config, section, key, value)?;
    }

    config.validate().map_err(ParseError::Invalid)?;
    Ok(config)
}

fn strip_comment(line: &str) -> &str {
    match line.find('#') {
        Some(pos) => &line[..pos],
        None => line,
    }
}

/// Parse a section header like "motion" or "laser.alarm"
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "motion" => Ok(Section::Motion),
        "teach" => Ok(Section::Teach),
        "laser" => Ok(Section::Laser),
        "laser.alarm" => Ok(Section::Alarm),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Parse "key = value" line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let (key, value) = line.split_once('=')?;
    let key = key.trim();
    let value = value.trim();

    if key.is_empty() || value.is_empty() {
        return None;
    }

    Some((key, value))
}

/// Integer literals may use `_` separators (`5_000`)
fn parse_int<T: core::str::FromStr>(value: &str) -> Result<T, ParseError> {
    let mut digits: String<16> = String::new();
    for c in value.chars().filter(|&c| c != '_') {
        digits.push(c).map_err(|_| ParseError::InvalidValue)?;
    }
    digits.parse().map_err(|_| ParseError::InvalidValue)
}

fn parse_float(value: &str) -> Result<f32, ParseError> {
    value.parse().map_err(|_| ParseError::InvalidValue)
}

/// Parse `[a, b, c]` into exactly `SLOT_COUNT` positions
fn parse_positions(value: &str) -> Result<[u16; SLOT_COUNT], ParseError> {
    let inner = value
        .strip_prefix('[')
        .and_then(|v| v.strip_suffix(']'))
        .ok_or(ParseError::InvalidValue)?;

    let mut positions = [0u16; SLOT_COUNT];
    let mut count = 0;
    for item in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let slot = positions.get_mut(count).ok_or(ParseError::WrongLength)?;
        *slot = parse_int(item)?;
        count += 1;
    }

    if count != SLOT_COUNT {
        return Err(ParseError::WrongLength);
    }
    Ok(positions)
}

/// Apply a parsed value to the matching config field
fn apply_value(
    config: &mut MachineConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Root, "saved_positions") => config.saved_positions = parse_positions(value)?,

        (Section::Motion, "max_speed") => config.motion.max_speed = parse_float(value)?,
        (Section::Motion, "acceleration") => config.motion.acceleration = parse_float(value)?,
        (Section::Motion, "stop_tolerance") => config.motion.stop_tolerance = parse_float(value)?,

        (Section::Teach, "clear_steps") => config.teach.clear_steps = parse_int(value)?,
        (Section::Teach, "search_steps") => config.teach.search_steps = parse_int(value)?,
        (Section::Teach, "debounce_ms") => config.teach.debounce_ms = parse_int(value)?,

        (Section::Laser, "pulse_width_ms") => config.laser.pulse_width_ms = parse_int(value)?,

        (Section::Alarm, "beeps") => config.laser.alarm.beeps = parse_int(value)?,
        (Section::Alarm, "tone_ms") => config.laser.alarm.tone_ms = parse_int(value)?,
        (Section::Alarm, "gap_ms") => config.laser.alarm.gap_ms = parse_int(value)?,

        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}
