//! Laser trigger, supply relay and alarm speaker outputs

use embedded_hal::digital::{OutputPin, PinState};

use pld_core::traits::{laser::LaserLine, LaserIo};

/// The three laser lines on plain push-pull outputs
///
/// Levels are tracked locally so [`LaserIo::get`] does not depend on the
/// pin supporting readback.
pub struct LaserOutputs<P, R, S> {
    pulse: P,
    relay: R,
    speaker: S,
    levels: [bool; 3],
}

impl<P, R, S> LaserOutputs<P, R, S>
where
    P: OutputPin,
    R: OutputPin,
    S: OutputPin,
{
    /// Take the pins and drive every line low (supply connected)
    pub fn new(pulse: P, relay: R, speaker: S) -> Self {
        let mut outputs = Self {
            pulse,
            relay,
            speaker,
            levels: [false; 3],
        };
        for line in [LaserLine::Pulse, LaserLine::Relay, LaserLine::Speaker] {
            outputs.set(line, false);
        }
        outputs
    }

    fn index(line: LaserLine) -> usize {
        match line {
            LaserLine::Pulse => 0,
            LaserLine::Relay => 1,
            LaserLine::Speaker => 2,
        }
    }
}

impl<P, R, S> LaserIo for LaserOutputs<P, R, S>
where
    P: OutputPin,
    R: OutputPin,
    S: OutputPin,
{
    fn set(&mut self, line: LaserLine, high: bool) {
        let state = PinState::from(high);
        let written = match line {
            LaserLine::Pulse => self.pulse.set_state(state).is_ok(),
            LaserLine::Relay => self.relay.set_state(state).is_ok(),
            LaserLine::Speaker => self.speaker.set_state(state).is_ok(),
        };
        if written {
            self.levels[Self::index(line)] = high;
        }
    }

    fn get(&self, line: LaserLine) -> bool {
        self.levels[Self::index(line)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    #[derive(Default)]
    struct MockOutput {
        high: bool,
        broken: bool,
    }

    impl ErrorType for MockOutput {
        type Error = ErrorKind;
    }

    impl OutputPin for MockOutput {
        fn set_low(&mut self) -> Result<(), ErrorKind> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.high = false;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), ErrorKind> {
            if self.broken {
                return Err(ErrorKind::Other);
            }
            self.high = true;
            Ok(())
        }
    }

    fn outputs() -> LaserOutputs<MockOutput, MockOutput, MockOutput> {
        let relay = MockOutput {
            high: true,
            ..Default::default()
        };
        LaserOutputs::new(MockOutput::default(), relay, MockOutput::default())
    }

    #[test]
    fn test_starts_low() {
        let outputs = outputs();
        assert!(!outputs.relay.high);
        for line in [LaserLine::Pulse, LaserLine::Relay, LaserLine::Speaker] {
            assert!(!outputs.get(line));
        }
    }

    #[test]
    fn test_lines_are_independent() {
        let mut outputs = outputs();
        outputs.set(LaserLine::Relay, true);
        assert!(outputs.relay.high);
        assert!(outputs.get(LaserLine::Relay));
        assert!(!outputs.pulse.high);
        assert!(!outputs.speaker.high);

        outputs.set(LaserLine::Pulse, true);
        outputs.set(LaserLine::Speaker, true);
        outputs.set(LaserLine::Relay, false);
        assert!(outputs.pulse.high);
        assert!(outputs.speaker.high);
        assert!(!outputs.get(LaserLine::Relay));
    }

    #[test]
    fn test_failed_write_keeps_level() {
        let mut outputs = outputs();
        outputs.speaker.broken = true;
        outputs.set(LaserLine::Speaker, true);
        assert!(!outputs.get(LaserLine::Speaker));
    }
}
