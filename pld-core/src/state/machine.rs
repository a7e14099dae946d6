//! State machine definition
//!
//! Each control pass calls [`SystemState::step`] once with a snapshot of
//! what the hardware reports; the returned [`Action`] is carried out by the
//! controller. Commands and the laser sequencer change state through
//! [`SystemState::transition`].

use super::events::Event;

/// Machine states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SystemState {
    /// Waiting for commands
    #[default]
    Idle,
    /// Homing: evaluate the sensor and choose clear or search
    TeachStart,
    /// Homing: searching for the sensor edge
    TeachRight,
    /// Homing: moving off a sensor that was blocked at start
    TeachClear,
    /// Homing finished or a targeted move acknowledged (transient)
    TeachDone,
    /// Targeted move in progress
    MoveToPosition,
    /// Laser sequence in progress
    LaserActive,
    /// Manual mode requested (transient)
    ManualMode,
}

/// What the controller observed this pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Observations {
    /// Homing sensor reads blocked right now
    pub sensor_blocked: bool,
    /// Homing sensor has read blocked for the whole debounce window
    pub sensor_debounced: bool,
    /// Motion primitive has no distance left and is at rest
    pub move_complete: bool,
    /// Laser sequencer finished its sequence
    pub sequence_complete: bool,
    /// Homing has completed before
    pub teach_done: bool,
}

/// Side effect requested by a step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    None,
    /// Issue the short clearing move
    ClearSensor,
    /// Issue the long search move and restart the debounce
    SearchHome,
    /// Clearing move finished
    SensorCleared,
    /// Halt and define the current position as zero
    SetZero,
    /// Acknowledge the finished targeted move
    AcknowledgeMove,
    /// Set the teach flag and announce it
    MarkTeachDone,
    /// Clear the teach flag
    ClearTeach,
}

impl SystemState {
    /// Name reported in `SYSTEM_STATE:` lines
    pub fn name(&self) -> &'static str {
        match self {
            SystemState::Idle => "IDLE",
            SystemState::TeachStart => "TEACH_START",
            SystemState::TeachRight => "TEACH_RIGHT",
            SystemState::TeachClear => "TEACH_CLEAR",
            SystemState::TeachDone => "TEACH_DONE",
            SystemState::MoveToPosition => "MOVE_TO_POS",
            SystemState::LaserActive => "LASER_ACTIVE",
            SystemState::ManualMode => "MANUAL_MODE",
        }
    }

    pub fn is_idle(&self) -> bool {
        *self == SystemState::Idle
    }

    /// Advance by one control pass
    ///
    /// Never fails: a state whose condition has not been met stays put.
    pub fn step(self, obs: &Observations) -> (Self, Action) {
        use SystemState::*;

        match self {
            Idle => (Idle, Action::None),

            TeachStart if obs.sensor_blocked => (TeachClear, Action::ClearSensor),
            TeachStart => (TeachRight, Action::SearchHome),

            TeachClear if obs.move_complete => (TeachStart, Action::SensorCleared),
            TeachClear => (TeachClear, Action::None),

            TeachRight if obs.sensor_debounced => (TeachDone, Action::SetZero),
            TeachRight => (TeachRight, Action::None),

            TeachDone if obs.teach_done => (Idle, Action::None),
            TeachDone => (Idle, Action::MarkTeachDone),

            MoveToPosition if obs.move_complete => (TeachDone, Action::AcknowledgeMove),
            MoveToPosition => (MoveToPosition, Action::None),

            LaserActive if obs.sequence_complete => (Idle, Action::None),
            LaserActive => (LaserActive, Action::None),

            // Not a sustained mode: falls straight back to idle, un-homed
            ManualMode => (Idle, Action::ClearTeach),
        }
    }

    /// Apply an externally raised event
    pub fn transition(self, event: Event) -> Self {
        use Event::*;
        use SystemState::*;

        match (self, event) {
            (_, Reset) => Idle,
            (_, EnterManual) => ManualMode,
            (_, SequenceEnded) => Idle,

            (Idle, StartTeach) => TeachStart,
            (Idle, MoveStarted) => MoveToPosition,
            (Idle, SequenceStarted) => LaserActive,

            // Default: stay in current state
            _ => self,
        }
    }
}
