//! Command dispatch and the cooperative control pass
//!
//! The [`Controller`] owns every component and is driven from a single loop:
//!
//! 1. dispatch each buffered command line (admission checked per line)
//! 2. one state machine step
//! 3. one motion primitive step
//! 4. one laser timing check
//!
//! Replies produced along the way are queued in an [`Outbox`] and drained by
//! the transport after the pass.

use pld_protocol::{Command, LaserCommand, ParseError, Rejection, Reply};

use crate::admission::{Admission, BusyNotifier};
use crate::config::MachineConfig;
use crate::laser::LaserSequencer;
use crate::motion::{MoveGuard, MoveStart, StepperCoordinator};
use crate::outbox::Outbox;
use crate::state::{Action, Debounce, Event, Observations, SystemState};
use crate::traits::{HomingSensor, LaserIo, MotionPrimitive};

/// Top-level control logic
pub struct Controller<M, S, L> {
    config: MachineConfig,
    state: SystemState,
    teach_done: bool,
    debounce: Debounce,
    stepper: StepperCoordinator<M>,
    laser: LaserSequencer<L>,
    sensor: S,
    busy: BusyNotifier,
    outbox: Outbox,
}

impl<M, S, L> Controller<M, S, L>
where
    M: MotionPrimitive,
    S: HomingSensor,
    L: LaserIo,
{
    /// Assemble the controller; starts idle and un-homed
    pub fn new(motion: M, sensor: S, laser_io: L, config: MachineConfig) -> Self {
        Self {
            state: SystemState::Idle,
            teach_done: false,
            debounce: Debounce::new(config.teach.debounce_ms),
            stepper: StepperCoordinator::new(motion, &config),
            laser: LaserSequencer::new(laser_io, config.laser),
            sensor,
            busy: BusyNotifier::new(),
            outbox: Outbox::new(),
            config,
        }
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn is_teach_done(&self) -> bool {
        self.teach_done
    }

    pub fn stepper(&self) -> &StepperCoordinator<M> {
        &self.stepper
    }

    pub fn laser(&self) -> &LaserSequencer<L> {
        &self.laser
    }

    /// Next queued reply
    pub fn pop_reply(&mut self) -> Option<Reply> {
        self.outbox.pop()
    }

    /// Replies lost to a full outbox since the last call
    pub fn take_dropped_replies(&mut self) -> u32 {
        self.outbox.take_dropped()
    }

    /// One full control pass
    pub fn run_pass<'a, I>(&mut self, lines: I, now_us: u64)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for line in lines {
            self.handle_line(line, now_us);
        }
        self.step(now_us);
        self.stepper.run(now_us);
        self.tick_laser(now_us);
    }

    /// Admit and dispatch one command line
    pub fn handle_line(&mut self, line: &str, now_us: u64) {
        let parsed = Command::parse(line);
        let always_allowed = matches!(&parsed, Ok(cmd) if cmd.is_always_allowed());

        match self.busy.admit(always_allowed, self.state.is_idle()) {
            Admission::Accept => {}
            Admission::Busy => {
                self.outbox.push(Reply::Busy);
                return;
            }
            Admission::Suppressed => return,
        }

        match parsed {
            Ok(cmd) => self.dispatch(cmd, now_us / 1000),
            Err(ParseError::Unknown) => self.outbox.push(Reply::unknown(line)),
            Err(ParseError::InvalidArgument) => self.reject(Rejection::InvalidArgument),
            Err(ParseError::InvalidLaserFormat) => self.reject(Rejection::InvalidLaserFormat),
            Err(ParseError::UnknownLaserCommand) => self.reject(Rejection::UnknownLaserCommand),
        }
    }

    fn reject(&mut self, reason: Rejection) {
        self.outbox.push(Reply::Rejected(reason));
    }

    fn guard(&self) -> MoveGuard {
        MoveGuard {
            teach_done: self.teach_done,
            laser_active: self.laser.is_active(),
        }
    }

    fn raise(&mut self, event: Event) {
        let previous = self.state;
        self.state = self.state.transition(event);
        if previous == SystemState::MoveToPosition && self.state != previous {
            // Forced out of the move phase: nothing will acknowledge it
            self.stepper.abandon_move();
        }
    }

    fn move_started(&mut self, result: Result<MoveStart, Rejection>) {
        match result {
            Ok(start) => {
                self.outbox.push(Reply::MoveStarted {
                    target: start.target,
                    steps: u32::from(start.steps),
                });
                self.raise(Event::MoveStarted);
            }
            Err(reason) => self.reject(reason),
        }
    }

    fn dispatch(&mut self, cmd: Command, now_ms: u64) {
        match cmd {
            Command::Teach => self.raise(Event::StartTeach),
            Command::Save(slot) => match self.stepper.save(slot, self.teach_done) {
                Ok(position) => self.outbox.push(Reply::PositionSaved {
                    slot: slot as u8,
                    position,
                }),
                Err(reason) => self.reject(reason),
            },
            Command::Load(slot) => {
                let result = self.stepper.load(slot, self.guard());
                self.move_started(result);
            }
            Command::Goto(target) => {
                let result = self.stepper.goto(target, self.guard());
                self.move_started(result);
            }
            Command::Position => {
                let position = self.stepper.normalized_position();
                self.outbox.push(Reply::Position(position));
            }
            Command::Status => self.report_status(),
            Command::SetMaxSpeed(speed) => match self.stepper.set_max_speed(speed) {
                Ok(()) => self.outbox.push(Reply::MaxSpeedSet(speed)),
                Err(reason) => self.reject(reason),
            },
            Command::SetAcceleration(accel) => match self.stepper.set_acceleration(accel) {
                Ok(()) => self.outbox.push(Reply::AccelerationSet(accel)),
                Err(reason) => self.reject(reason),
            },
            Command::Reset => {
                self.teach_done = false;
                self.raise(Event::Reset);
                self.outbox.push(Reply::TeachReset);
            }
            Command::Laser(laser) => self.dispatch_laser(laser, now_ms),
            Command::Manual => {
                self.stepper.stop();
                self.laser.stop(&mut self.outbox);
                self.stepper.set_driver_enabled(false);
                self.outbox.push(Reply::DriverEnabled(false));
                self.outbox.push(Reply::ManualMode);
                self.raise(Event::EnterManual);
            }
            Command::Auto => {
                self.stepper.set_zero();
                self.stepper.set_driver_enabled(true);
                self.outbox.push(Reply::DriverEnabled(true));
                self.outbox.push(Reply::AutoMode);
            }
            Command::EstimateMove(target) => match self.stepper.estimate_move_ms(target) {
                Ok(ms) => self.outbox.push(Reply::MoveEstimate { ms }),
                Err(reason) => self.reject(reason),
            },
            Command::EstimateLaser { pulses, frequency } => {
                match self.laser.estimate_ms(pulses, frequency) {
                    Ok(ms) => self.outbox.push(Reply::LaserEstimate { ms }),
                    Err(reason) => self.reject(reason),
                }
            }
        }
    }

    fn dispatch_laser(&mut self, cmd: LaserCommand, now_ms: u64) {
        match cmd {
            LaserCommand::Start { pulses, frequency } => {
                match self.laser.start(pulses, frequency, now_ms, &mut self.outbox) {
                    Ok(()) => self.raise(Event::SequenceStarted),
                    Err(reason) => self.reject(reason),
                }
            }
            LaserCommand::Stop => {
                self.laser.stop(&mut self.outbox);
                self.raise(Event::SequenceEnded);
            }
            LaserCommand::KillPower => {
                if self.laser.kill_power(&mut self.outbox) {
                    self.raise(Event::SequenceEnded);
                }
            }
            LaserCommand::RestorePower => self.laser.restore_power(&mut self.outbox),
            LaserCommand::Status => {
                let status = self.laser.status();
                self.outbox.push(status);
            }
            LaserCommand::SelfTest => {
                if let Err(reason) = self.laser.start_self_test(now_ms, &mut self.outbox) {
                    self.reject(reason);
                }
            }
        }
    }

    fn report_status(&mut self) {
        self.outbox.push(Reply::TeachStatus(self.teach_done));
        self.outbox
            .push(Reply::Position(self.stepper.normalized_position()));
        for (slot, position) in self.stepper.saved_positions().iter() {
            self.outbox.push(Reply::SavedPosition { slot, position });
        }
        self.outbox.push(Reply::Profile {
            max_speed: self.stepper.max_speed(),
            acceleration: self.stepper.acceleration(),
        });
        self.outbox.push(Reply::LastMove(self.stepper.last_move()));
        self.outbox.push(self.laser.status());
        self.outbox.push(Reply::SystemState(self.state.name()));
    }

    /// One state machine step
    pub fn step(&mut self, now_us: u64) {
        let now_ms = now_us / 1000;
        let sensor_blocked = self.sensor.is_blocked();
        let sensor_debounced =
            self.state == SystemState::TeachRight && self.debounce.update(sensor_blocked, now_ms);

        let obs = Observations {
            sensor_blocked,
            sensor_debounced,
            move_complete: self.stepper.is_move_complete(),
            sequence_complete: self.laser.is_completed(),
            teach_done: self.teach_done,
        };

        let (next, action) = self.state.step(&obs);
        self.state = next;
        self.apply(action);
        self.busy.observe(self.state.is_idle());
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::ClearSensor => {
                self.outbox.push(Reply::TeachClearing);
                self.teach_move(self.config.teach.clear_steps);
            }
            Action::SearchHome => {
                self.debounce.reset();
                self.outbox.push(Reply::TeachSearching);
                self.teach_move(self.config.teach.search_steps);
            }
            Action::SensorCleared => self.outbox.push(Reply::TeachCleared),
            Action::SetZero => {
                self.stepper.stop();
                self.stepper.set_zero();
                self.outbox.push(Reply::ZeroSet);
            }
            Action::AcknowledgeMove => {
                if let Some(kind) = self.stepper.check_move_complete() {
                    self.outbox.push(Reply::MoveDone(kind));
                }
            }
            Action::MarkTeachDone => {
                self.teach_done = true;
                self.outbox.push(Reply::TeachDone);
            }
            Action::ClearTeach => self.teach_done = false,
        }
    }

    /// Issue a homing move; homing is abandoned if the move is refused
    fn teach_move(&mut self, steps: u32) {
        let laser_active = self.laser.is_active();
        if let Err(reason) = self.stepper.move_relative(i64::from(steps), laser_active) {
            self.reject(reason);
            self.raise(Event::Reset);
        }
    }

    fn tick_laser(&mut self, now_us: u64) {
        if self.laser.tick(now_us / 1000, &mut self.outbox) {
            self.raise(Event::SequenceEnded);
        }
    }
}
