//! Configuration type definitions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use pld_protocol::SLOT_COUNT;

/// Steps per full revolution of the rotary stage
pub const MAX_STEP: u16 = 1600;

/// Default saved-position table (six equally spaced slots)
pub const DEFAULT_SAVED_POSITIONS: [u16; SLOT_COUNT] = [0, 267, 533, 800, 1067, 1333];

/// Configuration errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// Max speed is not a positive finite number
    InvalidMaxSpeed,
    /// Acceleration is not a positive finite number
    InvalidAcceleration,
    /// Stop tolerance is not a positive finite number
    InvalidTolerance,
    /// Teach clearing or search distance is zero
    InvalidTeachDistance,
    /// Pulse width is zero
    InvalidPulseWidth,
    /// Saved position outside `0..MAX_STEP`
    PositionOutOfRange,
}

/// Motion profile
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct MotionConfig {
    /// Maximum speed in steps/s
    pub max_speed: f32,
    /// Acceleration in steps/s²
    pub acceleration: f32,
    /// Speed below which the axis counts as stopped (steps/s)
    pub stop_tolerance: f32,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            max_speed: 500.0,
            acceleration: 500.0,
            stop_tolerance: 0.5,
        }
    }
}

/// Homing ("teach") parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct TeachConfig {
    /// Move used to get off the sensor when it is blocked at start
    pub clear_steps: u32,
    /// Long move used to search for the sensor edge
    pub search_steps: u32,
    /// How long the sensor must read blocked before the edge counts
    pub debounce_ms: u32,
}

impl Default for TeachConfig {
    fn default() -> Self {
        Self {
            clear_steps: 200,
            search_steps: 5000,
            debounce_ms: 50,
        }
    }
}

/// Pre-fire alarm pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct AlarmConfig {
    /// Number of beeps
    pub beeps: u8,
    /// Length of each beep
    pub tone_ms: u32,
    /// Silence between beeps
    pub gap_ms: u32,
}

impl Default for AlarmConfig {
    fn default() -> Self {
        Self {
            beeps: 3,
            tone_ms: 500,
            gap_ms: 250,
        }
    }
}

impl AlarmConfig {
    /// Total alarm duration in milliseconds
    pub fn duration_ms(&self) -> u32 {
        let beeps = u32::from(self.beeps);
        if beeps == 0 {
            return 0;
        }
        beeps * self.tone_ms + (beeps - 1) * self.gap_ms
    }
}

/// Laser timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct LaserConfig {
    /// How long the pulse line is held high per shot
    pub pulse_width_ms: u32,
    /// Alarm played before the first pulse
    pub alarm: AlarmConfig,
}

impl Default for LaserConfig {
    fn default() -> Self {
        Self {
            pulse_width_ms: 10,
            alarm: AlarmConfig::default(),
        }
    }
}

/// Complete machine configuration
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct MachineConfig {
    pub motion: MotionConfig,
    pub teach: TeachConfig,
    pub laser: LaserConfig,
    /// Initial contents of the saved-position table
    pub saved_positions: [u16; SLOT_COUNT],
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            motion: MotionConfig::default(),
            teach: TeachConfig::default(),
            laser: LaserConfig::default(),
            saved_positions: DEFAULT_SAVED_POSITIONS,
        }
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

impl MachineConfig {
    /// Check every value is usable
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !positive(self.motion.max_speed) {
            return Err(ConfigError::InvalidMaxSpeed);
        }
        if !positive(self.motion.acceleration) {
            return Err(ConfigError::InvalidAcceleration);
        }
        if !positive(self.motion.stop_tolerance) {
            return Err(ConfigError::InvalidTolerance);
        }
        if self.teach.clear_steps == 0 || self.teach.search_steps == 0 {
            return Err(ConfigError::InvalidTeachDistance);
        }
        if self.laser.pulse_width_ms == 0 {
            return Err(ConfigError::InvalidPulseWidth);
        }
        if self.saved_positions.iter().any(|&p| p >= MAX_STEP) {
            return Err(ConfigError::PositionOutOfRange);
        }
        Ok(())
    }
}
