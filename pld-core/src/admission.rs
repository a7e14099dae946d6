//! Busy/idle admission policy
//!
//! Allow-listed commands are always admitted. Anything else is admitted only
//! while the machine is idle; otherwise it is dropped, and the first drop of
//! each busy episode produces a single notice.

/// Outcome of an admission check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Admission {
    /// Execute the command
    Accept,
    /// Drop the command and emit the busy notice
    Busy,
    /// Drop the command silently (notice already sent this episode)
    Suppressed,
}

/// Edge-triggered busy notifier
#[derive(Debug, Clone, Copy, Default)]
pub struct BusyNotifier {
    notified: bool,
}

impl BusyNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decide whether a command may run
    pub fn admit(&mut self, always_allowed: bool, idle: bool) -> Admission {
        if idle {
            self.notified = false;
        }
        if always_allowed || idle {
            return Admission::Accept;
        }
        if self.notified {
            Admission::Suppressed
        } else {
            self.notified = true;
            Admission::Busy
        }
    }

    /// Track the machine state; returning to idle re-arms the notice
    pub fn observe(&mut self, idle: bool) {
        if idle {
            self.notified = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_admits_everything() {
        let mut notifier = BusyNotifier::new();
        assert_eq!(notifier.admit(false, true), Admission::Accept);
        assert_eq!(notifier.admit(true, true), Admission::Accept);
    }

    #[test]
    fn test_allow_list_bypasses_busy() {
        let mut notifier = BusyNotifier::new();
        assert_eq!(notifier.admit(true, false), Admission::Accept);
        // Allow-listed traffic does not consume the notice
        assert_eq!(notifier.admit(false, false), Admission::Busy);
    }

    #[test]
    fn test_one_notice_per_busy_episode() {
        let mut notifier = BusyNotifier::new();
        assert_eq!(notifier.admit(false, false), Admission::Busy);
        assert_eq!(notifier.admit(false, false), Admission::Suppressed);
        assert_eq!(notifier.admit(false, false), Admission::Suppressed);

        notifier.observe(false);
        assert_eq!(notifier.admit(false, false), Admission::Suppressed);

        // Back to idle, then busy again: a fresh notice
        notifier.observe(true);
        assert_eq!(notifier.admit(false, false), Admission::Busy);
    }
}
