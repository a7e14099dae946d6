//! Command parsing
//!
//! Every command line starts with `CMD:`. Keywords are case-sensitive.
//! Commands that take a value accept an optional `:` between keyword and
//! value, so `CMD:GOTO:400` and `CMD:GOTO400` are equivalent.

/// Command prefix shared by every line
pub const COMMAND_PREFIX: &str = "CMD:";

/// A parsed command
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Start the homing ("teach") sequence
    Teach,
    /// Save the current position to a slot (1-6)
    Save(i32),
    /// Move forward to a saved slot (1-6)
    Load(i32),
    /// Move forward to an absolute position
    Goto(i32),
    /// Report the normalized position
    Position,
    /// Full status dump
    Status,
    /// Set maximum speed in steps/s
    SetMaxSpeed(f32),
    /// Set acceleration in steps/s²
    SetAcceleration(f32),
    /// Clear teach status and return to idle
    Reset,
    /// Laser sub-command
    Laser(LaserCommand),
    /// Disable the driver for hand positioning
    Manual,
    /// Re-enable the driver
    Auto,
    /// Estimate the time to reach a position, in ms
    EstimateMove(i32),
    /// Estimate the duration of a laser sequence, in ms
    EstimateLaser { pulses: i32, frequency: f32 },
}

/// Laser sub-commands (`CMD:LASER_...`)
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LaserCommand {
    /// `p<N>f<F>`: fire N pulses at F Hz
    Start { pulses: i32, frequency: f32 },
    /// `stop`
    Stop,
    /// `killp`: open the power interlock
    KillPower,
    /// `restorep`: close the power interlock
    RestorePower,
    /// `status`
    Status,
    /// `test`: exercise every laser output line
    SelfTest,
}

/// Errors produced while parsing a command line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Not a recognized command
    Unknown,
    /// Recognized keyword with a missing or non-numeric value
    InvalidArgument,
    /// `CMD:LASER_p...` without a valid `p<N>f<F>` body
    InvalidLaserFormat,
    /// `CMD:LASER_...` with an unrecognized sub-command
    UnknownLaserCommand,
}

impl Command {
    /// Parse a single trimmed line
    pub fn parse(line: &str) -> Result<Self, ParseError> {
        let body = line.strip_prefix(COMMAND_PREFIX).ok_or(ParseError::Unknown)?;

        match body {
            "TEACH" => return Ok(Command::Teach),
            "POS" => return Ok(Command::Position),
            "STATUS" => return Ok(Command::Status),
            "RESET" => return Ok(Command::Reset),
            "MANUALLY" => return Ok(Command::Manual),
            "AUTO" => return Ok(Command::Auto),
            _ => {}
        }

        if let Some(rest) = body.strip_prefix("LASER_") {
            return parse_laser(rest).map(Command::Laser);
        }
        if let Some(rest) = body.strip_prefix("ESTIMATE_MOVE") {
            return parse_int(rest).map(Command::EstimateMove);
        }
        if let Some(rest) = body.strip_prefix("ESTIMATE_LASER") {
            let spec = argument(rest)
                .strip_prefix('p')
                .ok_or(ParseError::InvalidLaserFormat)?;
            let (pulses, frequency) = parse_pulse_spec(spec)?;
            return Ok(Command::EstimateLaser { pulses, frequency });
        }
        if let Some(rest) = body.strip_prefix("SETMAXSPEED") {
            return parse_float(rest).map(Command::SetMaxSpeed);
        }
        if let Some(rest) = body.strip_prefix("SETACCEL") {
            return parse_float(rest).map(Command::SetAcceleration);
        }
        if let Some(rest) = body.strip_prefix("SAVE") {
            return parse_int(rest).map(Command::Save);
        }
        if let Some(rest) = body.strip_prefix("LOAD") {
            return parse_int(rest).map(Command::Load);
        }
        if let Some(rest) = body.strip_prefix("GOTO") {
            return parse_int(rest).map(Command::Goto);
        }

        Err(ParseError::Unknown)
    }

    /// Commands accepted regardless of the machine state
    pub fn is_always_allowed(&self) -> bool {
        matches!(
            self,
            Command::Position
                | Command::Status
                | Command::Laser(LaserCommand::Stop)
                | Command::EstimateMove(_)
                | Command::EstimateLaser { .. }
        )
    }
}

fn parse_laser(rest: &str) -> Result<LaserCommand, ParseError> {
    match rest {
        "stop" => Ok(LaserCommand::Stop),
        "killp" => Ok(LaserCommand::KillPower),
        "restorep" => Ok(LaserCommand::RestorePower),
        "status" => Ok(LaserCommand::Status),
        "test" => Ok(LaserCommand::SelfTest),
        _ => {
            let spec = rest
                .strip_prefix('p')
                .ok_or(ParseError::UnknownLaserCommand)?;
            let (pulses, frequency) = parse_pulse_spec(spec)?;
            Ok(LaserCommand::Start { pulses, frequency })
        }
    }
}

/// Parse `<N>f<F>` (the part after the leading `p`)
fn parse_pulse_spec(spec: &str) -> Result<(i32, f32), ParseError> {
    let (pulses, frequency) = spec.split_once('f').ok_or(ParseError::InvalidLaserFormat)?;
    let pulses = pulses
        .trim()
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidLaserFormat)?;
    let frequency = frequency
        .trim()
        .parse::<f32>()
        .map_err(|_| ParseError::InvalidLaserFormat)?;
    Ok((pulses, frequency))
}

fn argument(rest: &str) -> &str {
    rest.strip_prefix(':').unwrap_or(rest).trim()
}

fn parse_int(rest: &str) -> Result<i32, ParseError> {
    argument(rest)
        .parse::<i32>()
        .map_err(|_| ParseError::InvalidArgument)
}

fn parse_float(rest: &str) -> Result<f32, ParseError> {
    argument(rest)
        .parse::<f32>()
        .map_err(|_| ParseError::InvalidArgument)
}
