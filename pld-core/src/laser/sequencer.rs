//! Laser pulse sequencer
//!
//! A sequence is started with a pulse count and frequency, sounds the alarm,
//! then fires one pulse per period from the control loop. Pulse-off is
//! scheduled `pulse_width_ms` after pulse-on; nothing here ever waits.
//!
//! ```text
//!  start ──► Alarm ──(pattern done)──► Firing ──(last pulse)──► Idle
//!    ▲                                                          │
//!    └────────────── stop / kill power from any phase ◄─────────┘
//! ```

use pld_protocol::{LaserLine, Reply, Rejection};

use super::alarm::Alarm;
use super::self_test::SelfTest;
use crate::config::LaserConfig;
use crate::outbox::Outbox;
use crate::traits::LaserIo;

/// Progress is reported every this many pulses
pub const PROGRESS_INTERVAL: u32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Alarm(Alarm),
    Firing,
}

/// Validated sequence parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PulsePlan {
    /// Number of pulses to fire
    pub pulses: u32,
    /// Time between pulse starts
    pub period_ms: u32,
}

/// Drives the pulse, relay and speaker lines
pub struct LaserSequencer<L> {
    io: L,
    config: LaserConfig,
    phase: Phase,
    fired: u32,
    total: u32,
    period_ms: u32,
    last_fired_ms: u64,
    pulse_off_at: Option<u64>,
    completed: bool,
    self_test: Option<SelfTest>,
}

impl<L: LaserIo> LaserSequencer<L> {
    /// Take ownership of the outputs and park every line low (power on)
    pub fn new(mut io: L, config: LaserConfig) -> Self {
        io.set(LaserLine::Pulse, false);
        io.set(LaserLine::Relay, false);
        io.set(LaserLine::Speaker, false);

        Self {
            io,
            config,
            phase: Phase::Idle,
            fired: 0,
            total: 0,
            period_ms: 0,
            last_fired_ms: 0,
            pulse_off_at: None,
            completed: false,
            self_test: None,
        }
    }

    /// Underlying outputs
    pub fn io(&self) -> &L {
        &self.io
    }

    /// A sequence is sounding its alarm or firing
    pub fn is_active(&self) -> bool {
        self.phase != Phase::Idle
    }

    /// The last sequence ran to completion
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// The power interlock is closed
    pub fn is_power_on(&self) -> bool {
        !self.io.get(LaserLine::Relay)
    }

    pub fn is_self_test_running(&self) -> bool {
        self.self_test.is_some()
    }

    /// Check pulse count and frequency against the configured pulse width
    pub fn plan(&self, pulses: i32, frequency: f32) -> Result<PulsePlan, Rejection> {
        if pulses <= 0 || !frequency.is_finite() || frequency <= 0.0 {
            return Err(Rejection::InvalidPulseParameters);
        }
        // Truncated to whole milliseconds
        let period_ms = (1000.0 / frequency) as u32;
        if period_ms <= self.config.pulse_width_ms {
            return Err(Rejection::FrequencyTooHigh);
        }
        Ok(PulsePlan {
            pulses: pulses as u32,
            period_ms,
        })
    }

    /// Expected sequence duration including the alarm
    pub fn estimate_ms(&self, pulses: i32, frequency: f32) -> Result<u32, Rejection> {
        let plan = self.plan(pulses, frequency)?;
        Ok(self
            .config
            .alarm
            .duration_ms()
            .saturating_add(plan.pulses.saturating_mul(plan.period_ms)))
    }

    /// Begin a sequence; the first pulse fires one period after the alarm
    pub fn start(
        &mut self,
        pulses: i32,
        frequency: f32,
        now_ms: u64,
        out: &mut Outbox,
    ) -> Result<(), Rejection> {
        let plan = self.plan(pulses, frequency)?;
        if self.is_active() {
            return Err(Rejection::SequenceAlreadyActive);
        }
        if !self.is_power_on() {
            return Err(Rejection::PowerDisconnected);
        }
        if self.is_self_test_running() {
            return Err(Rejection::SelfTestRunning);
        }

        self.total = plan.pulses;
        self.period_ms = plan.period_ms;
        self.fired = 0;
        self.completed = false;
        self.phase = Phase::Alarm(Alarm::start(self.config.alarm, now_ms));

        out.push(Reply::LaserStarted {
            pulses: plan.pulses,
            frequency,
        });
        out.push(Reply::Alarm);
        Ok(())
    }

    /// One non-blocking unit of work
    ///
    /// Returns `true` on the tick that completes a sequence.
    pub fn tick(&mut self, now_ms: u64, out: &mut Outbox) -> bool {
        if let Some(test) = self.self_test.as_mut() {
            if test.advance(now_ms, &mut self.io, out) {
                self.self_test = None;
            }
        }

        if let Some(off_at) = self.pulse_off_at {
            if now_ms >= off_at {
                self.io.set(LaserLine::Pulse, false);
                self.pulse_off_at = None;
            }
        }

        match self.phase {
            Phase::Idle => return false,
            Phase::Alarm(alarm) => match alarm.level(now_ms) {
                Some(level) => self.io.set(LaserLine::Speaker, level),
                None => {
                    self.io.set(LaserLine::Speaker, false);
                    self.phase = Phase::Firing;
                    self.last_fired_ms = now_ms;
                }
            },
            Phase::Firing => {
                let due = now_ms.saturating_sub(self.last_fired_ms) >= u64::from(self.period_ms);
                if due && self.fired < self.total {
                    self.fire(now_ms, out);
                }
            }
        }

        if self.total > 0 && self.fired >= self.total && !self.completed {
            self.phase = Phase::Idle;
            self.completed = true;
            out.push(Reply::LaserDone);
            out.push(self.status());
            self.fired = 0;
            self.total = 0;
            return true;
        }
        false
    }

    fn fire(&mut self, now_ms: u64, out: &mut Outbox) {
        self.io.set(LaserLine::Pulse, true);
        self.pulse_off_at = Some(now_ms + u64::from(self.config.pulse_width_ms));
        self.last_fired_ms = now_ms;
        self.fired += 1;

        if self.fired % PROGRESS_INTERVAL == 0 || self.fired == self.total {
            out.push(Reply::LaserProgress {
                fired: self.fired,
                total: self.total,
            });
        }
    }

    /// Drop the running sequence and rest the pulse and speaker lines
    fn halt(&mut self) {
        self.phase = Phase::Idle;
        self.fired = 0;
        self.total = 0;
        self.completed = false;
        self.pulse_off_at = None;
        self.io.set(LaserLine::Pulse, false);
        self.io.set(LaserLine::Speaker, false);
    }

    fn cancel_self_test(&mut self) {
        if let Some(test) = self.self_test.take() {
            test.abort(&mut self.io);
        }
    }

    /// Unconditional stop
    pub fn stop(&mut self, out: &mut Outbox) {
        self.cancel_self_test();
        self.halt();
        out.push(Reply::LaserStopped);
    }

    /// Open the power interlock
    ///
    /// A running sequence is stopped first; returns `true` in that case.
    pub fn kill_power(&mut self, out: &mut Outbox) -> bool {
        let was_active = self.is_active();
        if was_active {
            self.halt();
            out.push(Reply::StoppedBeforePowerKill);
        }
        self.cancel_self_test();

        if self.is_power_on() {
            self.io.set(LaserLine::Relay, true);
            out.push(Reply::PowerKilled);
        } else {
            out.push(Reply::PowerAlreadyKilled);
        }
        was_active
    }

    /// Close the power interlock
    pub fn restore_power(&mut self, out: &mut Outbox) {
        self.cancel_self_test();

        if self.is_power_on() {
            out.push(Reply::PowerAlreadyOn);
        } else {
            self.io.set(LaserLine::Relay, false);
            out.push(Reply::PowerRestored);
        }
    }

    /// Begin the output self-test
    pub fn start_self_test(&mut self, now_ms: u64, out: &mut Outbox) -> Result<(), Rejection> {
        if self.is_active() {
            return Err(Rejection::SequenceAlreadyActive);
        }
        if self.is_self_test_running() {
            return Err(Rejection::SelfTestRunning);
        }
        let relay = self.io.get(LaserLine::Relay);
        self.self_test = Some(SelfTest::start(now_ms, relay));
        out.push(Reply::SelfTestStarted);
        Ok(())
    }

    /// Status line
    pub fn status(&self) -> Reply {
        Reply::LaserStatus {
            active: self.is_active(),
            fired: self.fired,
            total: self.total,
            power_on: self.is_power_on(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockLaser;

    const ALARM_MS: u64 = 2000;

    fn sequencer() -> LaserSequencer<MockLaser> {
        LaserSequencer::new(MockLaser::default(), LaserConfig::default())
    }

    fn drain(out: &mut Outbox) -> heapless::Vec<Reply, 64> {
        let mut replies = heapless::Vec::new();
        while let Some(reply) = out.pop() {
            replies.push(reply).unwrap();
        }
        replies
    }

    #[test]
    fn test_rejects_bad_parameters_without_state_change() {
        let mut seq = sequencer();
        let mut out = Outbox::new();
        assert_eq!(seq.start(0, 5.0, 0, &mut out), Err(Rejection::InvalidPulseParameters));
        assert_eq!(seq.start(-3, 5.0, 0, &mut out), Err(Rejection::InvalidPulseParameters));
        assert_eq!(seq.start(5, 0.0, 0, &mut out), Err(Rejection::InvalidPulseParameters));
        assert_eq!(seq.start(5, -1.0, 0, &mut out), Err(Rejection::InvalidPulseParameters));
        assert_eq!(seq.start(5, f32::NAN, 0, &mut out), Err(Rejection::InvalidPulseParameters));
        assert!(!seq.is_active());
        assert!(out.is_empty());
    }

    #[test]
    fn test_rejects_frequency_above_pulse_width() {
        let mut seq = sequencer();
        let mut out = Outbox::new();
        // 100 Hz -> 10 ms period, equal to the 10 ms pulse width
        assert_eq!(seq.start(5, 100.0, 0, &mut out), Err(Rejection::FrequencyTooHigh));
        assert_eq!(seq.plan(5, 50.0), Ok(PulsePlan { pulses: 5, period_ms: 20 }));
    }

    #[test]
    fn test_rejects_second_start_and_open_interlock() {
        let mut seq = sequencer();
        let mut out = Outbox::new();
        seq.start(3, 5.0, 0, &mut out).unwrap();
        assert_eq!(seq.start(3, 5.0, 0, &mut out), Err(Rejection::SequenceAlreadyActive));

        let mut seq = sequencer();
        seq.kill_power(&mut out);
        assert_eq!(seq.start(3, 5.0, 0, &mut out), Err(Rejection::PowerDisconnected));
        assert!(!seq.is_active());
    }

    #[test]
    fn test_alarm_precedes_firing() {
        let mut seq = sequencer();
        let mut out = Outbox::new();
        seq.start(1, 5.0, 0, &mut out).unwrap();

        seq.tick(0, &mut out);
        assert!(seq.io().speaker);
        seq.tick(600, &mut out);
        assert!(!seq.io().speaker);
        seq.tick(1000, &mut out);
        assert!(seq.io().speaker);
        assert_eq!(seq.io().pulse_edges, 0);

        // Alarm ends; pulse timer starts now
        seq.tick(ALARM_MS, &mut out);
        assert!(!seq.io().speaker);
        assert_eq!(seq.io().pulse_edges, 0);
        seq.tick(ALARM_MS + 199, &mut out);
        assert_eq!(seq.io().pulse_edges, 0);
        assert!(seq.tick(ALARM_MS + 200, &mut out));
        assert_eq!(seq.io().pulse_edges, 1);
    }

    #[test]
    fn test_n_ticks_complete_and_reset_counters() {
        let mut seq = sequencer();
        let mut out = Outbox::new();
        let pulses = 25;
        let period = 100; // 10 Hz
        seq.start(pulses, 10.0, 0, &mut out).unwrap();
        seq.tick(ALARM_MS, &mut out);

        let mut now = ALARM_MS;
        for i in 1..=pulses {
            now += period;
            // Pulse-off falls between firing ticks
            seq.tick(now - period / 2, &mut out);
            assert!(!seq.io().pulse);
            let done = seq.tick(now, &mut out);
            assert_eq!(done, i == pulses);
        }

        assert!(seq.is_completed());
        assert!(!seq.is_active());
        assert_eq!(seq.io().pulse_edges, pulses as u32);
        assert_eq!(
            seq.status(),
            Reply::LaserStatus {
                active: false,
                fired: 0,
                total: 0,
                power_on: true
            }
        );

        let replies = drain(&mut out);
        let progress: heapless::Vec<u32, 8> = replies
            .iter()
            .filter_map(|r| match r {
                Reply::LaserProgress { fired, .. } => Some(*fired),
                _ => None,
            })
            .collect();
        assert_eq!(progress.as_slice(), &[10, 20, 25]);
        assert!(replies.contains(&Reply::LaserDone));
        assert!(replies.contains(&Reply::LaserStatus {
            active: false,
            fired: 25,
            total: 25,
            power_on: true
        }));

        // Pulse line drops after the last pulse
        seq.tick(now + 10, &mut out);
        assert!(!seq.io().pulse);

        // A new sequence may start
        assert_eq!(seq.start(1, 1.0, now + 20, &mut out), Ok(()));
    }

    #[test]
    fn test_pulse_off_is_scheduled() {
        let mut seq = sequencer();
        let mut out = Outbox::new();
        seq.start(2, 10.0, 0, &mut out).unwrap();
        seq.tick(ALARM_MS, &mut out);
        seq.tick(ALARM_MS + 100, &mut out);
        assert!(seq.io().pulse);
        seq.tick(ALARM_MS + 109, &mut out);
        assert!(seq.io().pulse);
        seq.tick(ALARM_MS + 110, &mut out);
        assert!(!seq.io().pulse);
    }

    #[test]
    fn test_stop_is_unconditional() {
        let mut seq = sequencer();
        let mut out = Outbox::new();
        seq.stop(&mut out);
        assert_eq!(out.pop(), Some(Reply::LaserStopped));

        seq.start(5, 10.0, 0, &mut out).unwrap();
        seq.tick(ALARM_MS, &mut out);
        seq.tick(ALARM_MS + 100, &mut out);
        assert!(seq.io().pulse);
        seq.stop(&mut out);
        assert!(!seq.is_active());
        assert!(!seq.is_completed());
        assert!(!seq.io().pulse);
        assert_eq!(
            seq.status(),
            Reply::LaserStatus {
                active: false,
                fired: 0,
                total: 0,
                power_on: true
            }
        );
    }

    #[test]
    fn test_kill_power_while_active_stops_first() {
        let mut seq = sequencer();
        let mut out = Outbox::new();
        seq.start(5, 10.0, 0, &mut out).unwrap();
        drain(&mut out);

        assert!(seq.kill_power(&mut out));
        assert!(!seq.is_active());
        assert!(!seq.is_power_on());
        assert!(!seq.io().speaker);
        assert_eq!(out.pop(), Some(Reply::StoppedBeforePowerKill));
        assert_eq!(out.pop(), Some(Reply::PowerKilled));

        assert!(!seq.kill_power(&mut out));
        assert_eq!(out.pop(), Some(Reply::PowerAlreadyKilled));
    }

    #[test]
    fn test_restore_power() {
        let mut seq = sequencer();
        let mut out = Outbox::new();
        seq.restore_power(&mut out);
        assert_eq!(out.pop(), Some(Reply::PowerAlreadyOn));

        seq.kill_power(&mut out);
        out.pop();
        seq.restore_power(&mut out);
        assert_eq!(out.pop(), Some(Reply::PowerRestored));
        assert!(seq.is_power_on());
    }

    #[test]
    fn test_self_test_blocks_and_is_blocked() {
        let mut seq = sequencer();
        let mut out = Outbox::new();
        seq.start_self_test(0, &mut out).unwrap();
        assert_eq!(seq.start_self_test(0, &mut out), Err(Rejection::SelfTestRunning));
        assert_eq!(seq.start(1, 1.0, 0, &mut out), Err(Rejection::SelfTestRunning));

        for t in (0..=4000).step_by(100) {
            seq.tick(t, &mut out);
        }
        assert!(!seq.is_self_test_running());
        assert!(seq.is_power_on());
        assert!(drain(&mut out).contains(&Reply::SelfTestDone));

        seq.start(1, 1.0, 5000, &mut out).unwrap();
        assert_eq!(seq.start_self_test(5000, &mut out), Err(Rejection::SequenceAlreadyActive));
    }

    #[test]
    fn test_estimate_includes_alarm() {
        let seq = sequencer();
        assert_eq!(seq.estimate_ms(20, 10.0), Ok(2000 + 20 * 100));
        assert_eq!(seq.estimate_ms(0, 10.0), Err(Rejection::InvalidPulseParameters));
    }
}
