//! Homing edge debounce

/// Confirms the sensor has read blocked continuously for a window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Debounce {
    window_ms: u64,
    blocked_since: Option<u64>,
}

impl Debounce {
    pub fn new(window_ms: u32) -> Self {
        Self {
            window_ms: u64::from(window_ms),
            blocked_since: None,
        }
    }

    /// Forget any partially observed edge
    pub fn reset(&mut self) {
        self.blocked_since = None;
    }

    /// Feed one sample; `true` once blocked for at least the window
    pub fn update(&mut self, blocked: bool, now_ms: u64) -> bool {
        if !blocked {
            self.blocked_since = None;
            return false;
        }
        let since = *self.blocked_since.get_or_insert(now_ms);
        now_ms.saturating_sub(since) >= self.window_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_continuous_window() {
        let mut debounce = Debounce::new(50);
        assert!(!debounce.update(true, 100));
        assert!(!debounce.update(true, 149));
        assert!(debounce.update(true, 150));
    }

    #[test]
    fn test_clear_reading_restarts_window() {
        let mut debounce = Debounce::new(50);
        assert!(!debounce.update(true, 0));
        assert!(!debounce.update(true, 40));
        assert!(!debounce.update(false, 45));
        assert!(!debounce.update(true, 60));
        assert!(!debounce.update(true, 100));
        assert!(debounce.update(true, 110));
    }

    #[test]
    fn test_reset() {
        let mut debounce = Debounce::new(50);
        debounce.update(true, 0);
        debounce.reset();
        assert!(!debounce.update(true, 60));
        assert!(debounce.update(true, 110));
    }
}
