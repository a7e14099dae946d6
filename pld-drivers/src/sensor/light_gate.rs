//! Light-interrupt homing sensor
//!
//! A fork-type optical switch whose output changes level when a flag on
//! the carousel enters the light path. The gates on the controller board
//! drive their output high while blocked.

use embedded_hal::digital::InputPin;

use pld_core::traits::HomingSensor;

/// Light gate on a single digital input
pub struct LightGate<P> {
    pin: P,
    /// Input level that means "blocked"
    active_high: bool,
}

impl<P: InputPin> LightGate<P> {
    /// Gate that reads high while blocked
    pub fn new(pin: P) -> Self {
        Self {
            pin,
            active_high: true,
        }
    }

    /// Gate that reads low while blocked
    pub fn active_low(pin: P) -> Self {
        Self {
            pin,
            active_high: false,
        }
    }

    pub fn release(self) -> P {
        self.pin
    }
}

impl<P: InputPin> HomingSensor for LightGate<P> {
    fn is_blocked(&mut self) -> bool {
        // A read error counts as clear so homing keeps searching
        self.pin
            .is_high()
            .map(|high| high == self.active_high)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal::digital::{ErrorKind, ErrorType};

    struct MockInput {
        level: Result<bool, ErrorKind>,
    }

    impl ErrorType for MockInput {
        type Error = ErrorKind;
    }

    impl InputPin for MockInput {
        fn is_high(&mut self) -> Result<bool, ErrorKind> {
            self.level
        }

        fn is_low(&mut self) -> Result<bool, ErrorKind> {
            self.level.map(|high| !high)
        }
    }

    fn input(high: bool) -> MockInput {
        MockInput { level: Ok(high) }
    }

    #[test]
    fn test_active_high_gate() {
        assert!(LightGate::new(input(true)).is_blocked());
        assert!(!LightGate::new(input(false)).is_blocked());
    }

    #[test]
    fn test_active_low_gate() {
        assert!(LightGate::active_low(input(false)).is_blocked());
        assert!(!LightGate::active_low(input(true)).is_blocked());
    }

    #[test]
    fn test_read_error_is_clear() {
        let mut gate = LightGate::new(MockInput {
            level: Err(ErrorKind::Other),
        });
        assert!(!gate.is_blocked());
    }

    #[test]
    fn test_follows_pin_changes() {
        let mut gate = LightGate::new(input(false));
        assert!(!gate.is_blocked());
        gate.pin.level = Ok(true);
        assert!(gate.is_blocked());
        let pin = gate.release();
        assert_eq!(pin.level, Ok(true));
    }
}
