//! Non-blocking pre-fire alarm

use crate::config::AlarmConfig;

/// A running beep pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Alarm {
    pattern: AlarmConfig,
    started_ms: u64,
}

impl Alarm {
    /// Begin the pattern at `now_ms`
    pub fn start(pattern: AlarmConfig, now_ms: u64) -> Self {
        Self {
            pattern,
            started_ms: now_ms,
        }
    }

    /// Speaker level at `now_ms`, or `None` once the pattern has finished
    pub fn level(&self, now_ms: u64) -> Option<bool> {
        let elapsed = now_ms.saturating_sub(self.started_ms);
        if elapsed >= u64::from(self.pattern.duration_ms()) {
            return None;
        }
        let cycle = u64::from(self.pattern.tone_ms) + u64::from(self.pattern.gap_ms);
        Some(elapsed % cycle < u64::from(self.pattern.tone_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_three_beeps() {
        let alarm = Alarm::start(AlarmConfig::default(), 1000);
        // beep, gap, beep, gap, beep
        assert_eq!(alarm.level(1000), Some(true));
        assert_eq!(alarm.level(1499), Some(true));
        assert_eq!(alarm.level(1500), Some(false));
        assert_eq!(alarm.level(1749), Some(false));
        assert_eq!(alarm.level(1750), Some(true));
        assert_eq!(alarm.level(2250), Some(false));
        assert_eq!(alarm.level(2500), Some(true));
        assert_eq!(alarm.level(2999), Some(true));
        assert_eq!(alarm.level(3000), None);
    }

    #[test]
    fn test_silent_pattern_finishes_immediately() {
        let pattern = AlarmConfig {
            beeps: 0,
            ..AlarmConfig::default()
        };
        assert_eq!(Alarm::start(pattern, 0).level(0), None);
    }
}
