//! Events raised by the dispatcher and the laser sequencer

/// Events that force a state change from outside the step function
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// Teach command accepted
    StartTeach,
    /// Targeted move issued
    MoveStarted,
    /// Laser sequence accepted
    SequenceStarted,
    /// Laser sequence completed, stopped or cut off by the interlock
    SequenceEnded,
    /// Manual mode requested
    EnterManual,
    /// Reset command, or a homing move that could not be issued
    Reset,
}
