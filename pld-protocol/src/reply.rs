//! Replies and notices sent back over the command channel
//!
//! Each [`Reply`] renders to exactly one text line (without terminator).
//! Lines meant for automated callers carry a fixed prefix such as
//! `OK:GOTO`, `OK:LASER_DONE` or `SYSTEM_STATE:`; the rest is free text.

use core::fmt;

use heapless::String;

use crate::line::MAX_LINE_LEN;

/// Number of saved-position slots
pub const SLOT_COUNT: usize = 6;

/// Label attached to a move completion acknowledgment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveKind {
    /// Move to a saved slot
    Load,
    /// Move to an absolute position
    Goto,
}

/// Laser output lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LaserLine {
    /// Pulse trigger
    Pulse,
    /// Power interlock relay (high = power disconnected)
    Relay,
    /// Audible alarm
    Speaker,
}

impl LaserLine {
    /// Short name used in replies
    pub fn name(self) -> &'static str {
        match self {
            LaserLine::Pulse => "LASER_PIN",
            LaserLine::Relay => "LASER_RELAY",
            LaserLine::Speaker => "LASER_SPEAKER",
        }
    }
}

/// Why a command was not carried out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Rejection {
    /// Numeric argument missing or malformed
    InvalidArgument,
    /// Slot outside 1-6
    InvalidSlot,
    /// Position outside 0..MAX_STEP
    PositionOutOfRange,
    /// Speed not strictly positive
    InvalidMaxSpeed,
    /// Acceleration not strictly positive
    InvalidAcceleration,
    /// Homing has not completed
    TeachIncomplete,
    /// Driver disabled (manual mode)
    DriverDisabled,
    /// Laser is firing, motion not allowed
    LaserActive,
    /// Pulse count or frequency not strictly positive
    InvalidPulseParameters,
    /// Inter-pulse period does not exceed the configured pulse width
    FrequencyTooHigh,
    /// A sequence is already running
    SequenceAlreadyActive,
    /// Power interlock is open
    PowerDisconnected,
    /// The output self-test is running
    SelfTestRunning,
    /// Malformed `CMD:LASER_p<N>f<F>`
    InvalidLaserFormat,
    /// Unknown `CMD:LASER_` sub-command
    UnknownLaserCommand,
    /// Input line too long or not ASCII
    LineDiscarded,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Rejection::InvalidArgument => "invalid or missing numeric argument",
            Rejection::InvalidSlot => "invalid slot (1-6)",
            Rejection::PositionOutOfRange => "invalid position, valid range: 0 to 1599",
            Rejection::InvalidMaxSpeed => "invalid value for MaxSpeed",
            Rejection::InvalidAcceleration => "invalid value for Acceleration",
            Rejection::TeachIncomplete => "teach not completed",
            Rejection::DriverDisabled => "driver disabled, manual mode active",
            Rejection::LaserActive => "laser active, motion not possible",
            Rejection::InvalidPulseParameters => "invalid parameters: pulses>0 and frequency>0 required",
            Rejection::FrequencyTooHigh => "frequency too high for configured pulse width",
            Rejection::SequenceAlreadyActive => "laser sequence already running",
            Rejection::PowerDisconnected => "laser power disconnected, restore it first",
            Rejection::SelfTestRunning => "laser self-test running",
            Rejection::InvalidLaserFormat => "invalid format: CMD:LASER_p<count>f<frequency>",
            Rejection::UnknownLaserCommand => "unknown laser command",
            Rejection::LineDiscarded => "input line discarded (too long or not ASCII)",
        };
        f.write_str(reason)
    }
}

/// One line of output on the command channel
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    // Motion
    /// Current normalized position
    Position(u16),
    /// Forward move issued towards a target
    MoveStarted { target: u16, steps: u32 },
    /// Targeted move finished
    MoveDone(MoveKind),
    /// Position stored in a slot
    PositionSaved { slot: u8, position: u16 },
    /// Max speed updated
    MaxSpeedSet(f32),
    /// Acceleration updated
    AccelerationSet(f32),
    /// Driver enable flag changed
    DriverEnabled(bool),
    /// Manual mode entered (driver off, laser stopped)
    ManualMode,
    /// Automatic mode entered (position zeroed, driver on)
    AutoMode,

    // Teach
    /// Sensor blocked at start, moving off it
    TeachClearing,
    /// Searching for the sensor edge
    TeachSearching,
    /// Clearing move finished
    TeachCleared,
    /// Home edge confirmed, position zeroed
    ZeroSet,
    /// Homing finished
    TeachDone,
    /// Teach status cleared
    TeachReset,

    // Status dump
    /// Teach flag
    TeachStatus(bool),
    /// One saved slot
    SavedPosition { slot: u8, position: u16 },
    /// Motion profile
    Profile { max_speed: f32, acceleration: f32 },
    /// Label of the last targeted move, if any
    LastMove(Option<MoveKind>),
    /// Name of the current state
    SystemState(&'static str),

    // Laser
    /// Sequence accepted
    LaserStarted { pulses: u32, frequency: f32 },
    /// Alarm sounding before the first pulse
    Alarm,
    /// Progress report
    LaserProgress { fired: u32, total: u32 },
    /// Sequence finished
    LaserDone,
    /// Sequence stopped by command
    LaserStopped,
    /// Laser status line
    LaserStatus {
        active: bool,
        fired: u32,
        total: u32,
        power_on: bool,
    },
    /// Interlock opened
    PowerKilled,
    /// Interlock was already open
    PowerAlreadyKilled,
    /// Sequence was running when the interlock was opened
    StoppedBeforePowerKill,
    /// Interlock closed
    PowerRestored,
    /// Interlock was already closed
    PowerAlreadyOn,
    /// Self-test began
    SelfTestStarted,
    /// Self-test drove a line
    SelfTestOutput { line: LaserLine, high: bool },
    /// Self-test finished
    SelfTestDone,

    // Estimates
    /// Estimated move duration
    MoveEstimate { ms: u32 },
    /// Estimated sequence duration
    LaserEstimate { ms: u32 },

    // Admission / errors
    /// Command dropped because the machine is busy
    Busy,
    /// Command rejected
    Rejected(Rejection),
    /// Unrecognized command text
    UnknownCommand(String<MAX_LINE_LEN>),
}

impl Reply {
    /// Build an unknown-command reply, truncating the echoed text if needed
    pub fn unknown(text: &str) -> Self {
        let mut echo = String::new();
        for c in text.chars() {
            if echo.push(c).is_err() {
                break;
            }
        }
        Reply::UnknownCommand(echo)
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            MoveKind::Load => "LOAD",
            MoveKind::Goto => "GOTO",
        })
    }
}

fn on_off(high: bool) -> &'static str {
    if high {
        "HIGH"
    } else {
        "LOW"
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Reply::Position(pos) => write!(f, "POS: {}", pos),
            Reply::MoveStarted { target, steps } => {
                write!(f, "Moving to {} ({} steps)", target, steps)
            }
            Reply::MoveDone(kind) => write!(f, "OK:{}", kind),
            Reply::PositionSaved { slot, position } => {
                write!(f, "Position {} saved in slot {}", position, slot)
            }
            Reply::MaxSpeedSet(v) => write!(f, "MaxSpeed set to: {}", v),
            Reply::AccelerationSet(v) => write!(f, "Acceleration set to: {}", v),
            Reply::DriverEnabled(true) => f.write_str("Stepper driver enabled"),
            Reply::DriverEnabled(false) => f.write_str("Stepper driver disabled (manual mode)"),
            Reply::ManualMode => {
                f.write_str("Manual mode active: driver disabled, laser stopped")
            }
            Reply::AutoMode => f.write_str("Automatic mode active: driver enabled"),

            Reply::TeachClearing => f.write_str("Teach: clearing sensor"),
            Reply::TeachSearching => f.write_str("Teach: searching home"),
            Reply::TeachCleared => f.write_str("Teach: sensor cleared"),
            Reply::ZeroSet => f.write_str("Teach: zero position set"),
            Reply::TeachDone => f.write_str("OK:TEACH"),
            Reply::TeachReset => f.write_str("Teach reset"),

            Reply::TeachStatus(done) => write!(f, "TeachDone: {}", u8::from(*done)),
            Reply::SavedPosition { slot, position } => write!(f, "Slot {}: {}", slot, position),
            Reply::Profile {
                max_speed,
                acceleration,
            } => write!(f, "MaxSpeed: {} Acceleration: {}", max_speed, acceleration),
            Reply::LastMove(Some(kind)) => write!(f, "Last move: {}", kind),
            Reply::LastMove(None) => f.write_str("Last move: NONE"),
            Reply::SystemState(name) => write!(f, "SYSTEM_STATE: {}", name),

            Reply::LaserStarted { pulses, frequency } => {
                write!(f, "Starting laser sequence: {} pulses @ {:.1} Hz", pulses, frequency)
            }
            Reply::Alarm => f.write_str("Alarm sounding"),
            Reply::LaserProgress { fired, total } => {
                write!(f, "Laser pulse {}/{}", fired, total)
            }
            Reply::LaserDone => f.write_str("OK:LASER_DONE"),
            Reply::LaserStopped => f.write_str("Laser stopped"),
            Reply::LaserStatus {
                active,
                fired,
                total,
                power_on,
            } => write!(
                f,
                "Laser Status: {} | Progress: {}/{} | Relay: {}",
                if *active { "ACTIVE" } else { "INACTIVE" },
                fired,
                total,
                if *power_on { "ON" } else { "OFF" }
            ),
            Reply::PowerKilled => f.write_str("Laser power disconnected"),
            Reply::PowerAlreadyKilled => f.write_str("Laser power already disconnected"),
            Reply::StoppedBeforePowerKill => f.write_str("Laser stopped before power cut"),
            Reply::PowerRestored => f.write_str("Laser power restored"),
            Reply::PowerAlreadyOn => f.write_str("Laser power already active"),
            Reply::SelfTestStarted => f.write_str("Starting laser self-test"),
            Reply::SelfTestOutput { line, high } => {
                write!(f, "{} -> {}", line.name(), on_off(*high))
            }
            Reply::SelfTestDone => f.write_str("Laser self-test complete"),

            Reply::MoveEstimate { ms } => write!(f, "ESTIMATE_MOVE:{}", ms),
            Reply::LaserEstimate { ms } => write!(f, "ESTIMATE_LASER:{}", ms),

            Reply::Busy => f.write_str("BUSY: system busy, command ignored"),
            Reply::Rejected(reason) => write!(f, "ERR: {}", reason),
            Reply::UnknownCommand(text) => write!(f, "ERR: unknown command: {}", text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;

    fn render(reply: &Reply) -> String<128> {
        let mut out = String::new();
        write!(out, "{}", reply).unwrap();
        out
    }

    #[test]
    fn test_machine_parseable_prefixes() {
        assert_eq!(render(&Reply::MoveDone(MoveKind::Goto)).as_str(), "OK:GOTO");
        assert_eq!(render(&Reply::MoveDone(MoveKind::Load)).as_str(), "OK:LOAD");
        assert_eq!(render(&Reply::LaserDone).as_str(), "OK:LASER_DONE");
        assert_eq!(render(&Reply::TeachDone).as_str(), "OK:TEACH");
        assert_eq!(
            render(&Reply::SystemState("IDLE")).as_str(),
            "SYSTEM_STATE: IDLE"
        );
    }

    #[test]
    fn test_laser_status_line() {
        let reply = Reply::LaserStatus {
            active: true,
            fired: 3,
            total: 10,
            power_on: true,
        };
        assert_eq!(
            render(&reply).as_str(),
            "Laser Status: ACTIVE | Progress: 3/10 | Relay: ON"
        );
    }

    #[test]
    fn test_rejection_line() {
        let reply = Reply::Rejected(Rejection::TeachIncomplete);
        assert_eq!(render(&reply).as_str(), "ERR: teach not completed");
    }

    #[test]
    fn test_unknown_truncates_long_echo() {
        let long = [b'X'; 200];
        let long = core::str::from_utf8(&long).unwrap();
        let reply = Reply::unknown(long);
        match reply {
            Reply::UnknownCommand(text) => assert_eq!(text.len(), MAX_LINE_LEN),
            _ => panic!("expected unknown command"),
        }
    }

    #[test]
    fn test_self_test_output() {
        let reply = Reply::SelfTestOutput {
            line: LaserLine::Relay,
            high: true,
        };
        assert_eq!(render(&reply).as_str(), "LASER_RELAY -> HIGH");
    }

    #[test]
    fn test_every_reply_fits_one_buffer() {
        let replies = [
            Reply::LaserStarted {
                pulses: u32::MAX,
                frequency: 1234.5,
            },
            Reply::Rejected(Rejection::InvalidPulseParameters),
            Reply::Rejected(Rejection::LineDiscarded),
            Reply::unknown(core::str::from_utf8(&[b'Y'; MAX_LINE_LEN]).unwrap()),
        ];
        for reply in &replies {
            let mut out: String<128> = String::new();
            assert!(write!(out, "{}", reply).is_ok());
        }
    }
}
