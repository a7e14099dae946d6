//! Stepper coordinator
//!
//! Owns the motion profile, the saved-position table, the driver-enable flag
//! and the intent of the outstanding targeted move. All targeted moves go
//! strictly forward along the circle.

use libm::fabsf;
use pld_protocol::{MoveKind, Rejection};

use super::planner::TrapezoidProfile;
use super::position::{check_target, forward_steps, normalize, MoveIntent, SavedPositions};
use crate::config::MachineConfig;
use crate::traits::MotionPrimitive;

/// Preconditions owned by other components, checked before moving
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveGuard {
    /// Homing has completed
    pub teach_done: bool,
    /// The laser is firing (or about to)
    pub laser_active: bool,
}

/// A targeted move that was issued
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveStart {
    /// Normalized target position
    pub target: u16,
    /// Forward steps issued
    pub steps: u16,
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}

/// Coordinates the motion primitive on the circular axis
pub struct StepperCoordinator<M> {
    motion: M,
    saved: SavedPositions,
    intent: MoveIntent,
    max_speed: f32,
    acceleration: f32,
    stop_tolerance: f32,
    driver_enabled: bool,
}

impl<M: MotionPrimitive> StepperCoordinator<M> {
    /// Take ownership of the motion primitive and apply the configured profile
    pub fn new(mut motion: M, config: &MachineConfig) -> Self {
        motion.set_max_speed(config.motion.max_speed);
        motion.set_acceleration(config.motion.acceleration);
        motion.set_current_position(0);
        motion.set_enabled(true);

        Self {
            motion,
            saved: SavedPositions::new(config.saved_positions),
            intent: MoveIntent::None,
            max_speed: config.motion.max_speed,
            acceleration: config.motion.acceleration,
            stop_tolerance: config.motion.stop_tolerance,
            driver_enabled: true,
        }
    }

    /// Underlying motion primitive
    pub fn motion(&self) -> &M {
        &self.motion
    }

    /// Advance the motion primitive by at most one step
    pub fn run(&mut self, now_us: u64) -> bool {
        self.motion.run(now_us)
    }

    /// Update the speed limit
    pub fn set_max_speed(&mut self, speed: f32) -> Result<(), Rejection> {
        if !positive(speed) {
            return Err(Rejection::InvalidMaxSpeed);
        }
        self.max_speed = speed;
        self.motion.set_max_speed(speed);
        Ok(())
    }

    /// Update the acceleration
    pub fn set_acceleration(&mut self, acceleration: f32) -> Result<(), Rejection> {
        if !positive(acceleration) {
            return Err(Rejection::InvalidAcceleration);
        }
        self.acceleration = acceleration;
        self.motion.set_acceleration(acceleration);
        Ok(())
    }

    pub fn max_speed(&self) -> f32 {
        self.max_speed
    }

    pub fn acceleration(&self) -> f32 {
        self.acceleration
    }

    /// Current profile, used for estimates
    pub fn profile(&self) -> TrapezoidProfile {
        TrapezoidProfile::new(self.max_speed, self.acceleration)
    }

    /// Accept or refuse motion commands; also energizes/releases the driver
    pub fn set_driver_enabled(&mut self, enabled: bool) {
        self.driver_enabled = enabled;
        self.motion.set_enabled(enabled);
    }

    pub fn is_driver_enabled(&self) -> bool {
        self.driver_enabled
    }

    /// Forward a relative move to the motion primitive
    pub fn move_relative(&mut self, steps: i64, laser_active: bool) -> Result<(), Rejection> {
        if !self.driver_enabled {
            return Err(Rejection::DriverDisabled);
        }
        if laser_active {
            return Err(Rejection::LaserActive);
        }
        self.motion.move_relative(steps);
        Ok(())
    }

    /// Move forward to an absolute position
    pub fn goto(&mut self, target: i32, guard: MoveGuard) -> Result<MoveStart, Rejection> {
        if !guard.teach_done {
            return Err(Rejection::TeachIncomplete);
        }
        let target = check_target(target)?;
        self.move_to_target(target, MoveIntent::Goto, guard)
    }

    /// Move forward to a saved slot
    pub fn load(&mut self, slot: i32, guard: MoveGuard) -> Result<MoveStart, Rejection> {
        if !guard.teach_done {
            return Err(Rejection::TeachIncomplete);
        }
        let target = self.saved.get(slot)?;
        self.move_to_target(target, MoveIntent::Load, guard)
    }

    fn move_to_target(
        &mut self,
        target: u16,
        intent: MoveIntent,
        guard: MoveGuard,
    ) -> Result<MoveStart, Rejection> {
        let steps = forward_steps(self.normalized_position(), target);
        self.move_relative(i64::from(steps), guard.laser_active)?;
        self.intent = intent;
        Ok(MoveStart { target, steps })
    }

    /// Store the current position in a slot
    pub fn save(&mut self, slot: i32, teach_done: bool) -> Result<u16, Rejection> {
        if !teach_done {
            return Err(Rejection::TeachIncomplete);
        }
        let position = self.normalized_position();
        self.saved.set(slot, position)?;
        Ok(position)
    }

    /// No distance left and the axis is (nearly) at rest
    pub fn is_move_complete(&self) -> bool {
        self.motion.distance_to_go() == 0 && fabsf(self.motion.speed()) < self.stop_tolerance
    }

    /// Consume the outstanding intent once the move has finished
    ///
    /// Returns the acknowledgment label, or `None` if the move is still
    /// running or nothing was outstanding.
    pub fn check_move_complete(&mut self) -> Option<MoveKind> {
        if !self.is_move_complete() {
            return None;
        }
        let label = self.intent.label();
        self.intent = MoveIntent::None;
        label
    }

    /// Forget the outstanding targeted move without acknowledging it
    pub fn abandon_move(&mut self) {
        self.intent = MoveIntent::None;
    }

    /// Label of the outstanding targeted move
    pub fn last_move(&self) -> Option<MoveKind> {
        self.intent.label()
    }

    /// Position wrapped into `0..MAX_STEP`
    pub fn normalized_position(&self) -> u16 {
        normalize(self.motion.current_position())
    }

    /// Decelerate to a stop
    pub fn stop(&mut self) {
        self.motion.stop();
    }

    /// Define the current position as zero
    pub fn set_zero(&mut self) {
        self.motion.set_current_position(0);
    }

    pub fn saved_positions(&self) -> &SavedPositions {
        &self.saved
    }

    /// Time for a forward move to `target` with the current profile
    pub fn estimate_move_ms(&self, target: i32) -> Result<u32, Rejection> {
        let target = check_target(target)?;
        let steps = forward_steps(self.normalized_position(), target);
        Ok(self.profile().duration_ms(u32::from(steps)))
    }
}
