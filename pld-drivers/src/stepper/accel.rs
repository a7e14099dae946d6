//! Acceleration-limited step/dir stepper
//!
//! Implements the constant-acceleration step scheduling of David Austin,
//! "Generate stepper-motor speed profiles in real time" (2005): the interval
//! between steps is updated with
//!
//! ```text
//! c0 = 0.676 * sqrt(2 / a) * 1e6 us
//! cn = cn-1 - 2 * cn-1 / (4n + 1)
//! ```
//!
//! where `n` counts steps since the start of the ramp (negative while
//! decelerating). `run()` must be called far more often than the step rate.
//! A step pulse is raised on one call and lowered on the next.

use embedded_hal::digital::{OutputPin, PinState};
use libm::{fabsf, sqrtf};

use pld_core::traits::MotionPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
enum Direction {
    Forward,
    Reverse,
}

/// Step/dir stepper driver with an active-low enable line
pub struct AccelStepper<STEP, DIR, EN> {
    step_pin: STEP,
    dir_pin: DIR,
    enable_pin: EN,
    step_high: bool,

    current: i64,
    target: i64,
    speed: f32,
    max_speed: f32,
    acceleration: f32,
    direction: Direction,

    /// Current step interval in microseconds (0 = stopped)
    step_interval_us: u32,
    last_step_us: u64,
    /// Ramp step counter
    n: i64,
    /// Initial step interval
    c0: f32,
    /// Last step interval
    cn: f32,
    /// Step interval at max speed
    cmin: f32,
}

impl<STEP, DIR, EN> AccelStepper<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    /// Create a stepper at position 0, energized
    pub fn new(step_pin: STEP, dir_pin: DIR, enable_pin: EN, max_speed: f32, acceleration: f32) -> Self {
        let mut stepper = Self {
            step_pin,
            dir_pin,
            enable_pin,
            step_high: false,
            current: 0,
            target: 0,
            speed: 0.0,
            max_speed: 0.0,
            acceleration: 0.0,
            direction: Direction::Forward,
            step_interval_us: 0,
            last_step_us: 0,
            n: 0,
            c0: 0.0,
            cn: 0.0,
            cmin: 1.0,
        };
        stepper.step_pin.set_low().ok();
        stepper.dir_pin.set_low().ok();
        stepper.apply_max_speed(max_speed);
        stepper.apply_acceleration(acceleration);
        stepper.set_enabled(true);
        stepper
    }

    /// Release the pins
    pub fn release(self) -> (STEP, DIR, EN) {
        (self.step_pin, self.dir_pin, self.enable_pin)
    }

    /// Absolute target position
    pub fn target_position(&self) -> i64 {
        self.target
    }

    fn move_to(&mut self, absolute: i64) {
        if self.target != absolute {
            self.target = absolute;
            self.compute_new_speed();
        }
    }

    fn steps_to_stop(&self) -> i64 {
        (self.speed * self.speed / (2.0 * self.acceleration)) as i64
    }

    fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
        let level = match direction {
            Direction::Forward => PinState::High,
            Direction::Reverse => PinState::Low,
        };
        self.dir_pin.set_state(level).ok();
    }

    /// Recompute the step interval after each step or target change
    fn compute_new_speed(&mut self) {
        let distance = self.target - self.current;
        let steps_to_stop = self.steps_to_stop();

        if distance == 0 && steps_to_stop <= 1 {
            // At the target and slow enough to stop dead
            self.step_interval_us = 0;
            self.speed = 0.0;
            self.n = 0;
            return;
        }

        if distance > 0 {
            if self.n > 0 {
                // Accelerating: start decelerating if we would overshoot or
                // are heading the wrong way
                if steps_to_stop >= distance || self.direction == Direction::Reverse {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0 && steps_to_stop < distance && self.direction == Direction::Forward {
                // Decelerating but there is room to speed up again
                self.n = -self.n;
            }
        } else if distance < 0 {
            if self.n > 0 {
                if steps_to_stop >= -distance || self.direction == Direction::Forward {
                    self.n = -steps_to_stop;
                }
            } else if self.n < 0 && steps_to_stop < -distance && self.direction == Direction::Reverse {
                self.n = -self.n;
            }
        }

        if self.n == 0 {
            // First step from standstill
            self.cn = self.c0;
            let direction = if distance > 0 {
                Direction::Forward
            } else {
                Direction::Reverse
            };
            self.set_direction(direction);
        } else {
            self.cn -= (2.0 * self.cn) / ((4.0 * self.n as f32) + 1.0);
            if self.cn < self.cmin {
                self.cn = self.cmin;
            }
        }
        self.n += 1;
        self.step_interval_us = self.cn as u32;
        self.speed = 1_000_000.0 / self.cn;
        if self.direction == Direction::Reverse {
            self.speed = -self.speed;
        }
    }

    /// Take one step if the interval has elapsed
    fn run_speed(&mut self, now_us: u64) -> bool {
        if self.step_interval_us == 0 {
            return false;
        }
        if now_us.saturating_sub(self.last_step_us) < u64::from(self.step_interval_us) {
            return false;
        }

        match self.direction {
            Direction::Forward => self.current += 1,
            Direction::Reverse => self.current -= 1,
        }
        self.step_pin.set_high().ok();
        self.step_high = true;
        self.last_step_us = now_us;
        true
    }

    fn apply_max_speed(&mut self, speed: f32) {
        let speed = fabsf(speed);
        if speed == 0.0 || self.max_speed == speed {
            return;
        }
        self.max_speed = speed;
        self.cmin = 1_000_000.0 / speed;
        if self.n > 0 && self.acceleration > 0.0 {
            // Re-enter the ramp at the step count for the new speed
            self.n = self.steps_to_stop();
            self.compute_new_speed();
        }
    }

    fn apply_acceleration(&mut self, acceleration: f32) {
        let acceleration = fabsf(acceleration);
        if acceleration == 0.0 || self.acceleration == acceleration {
            return;
        }
        if self.acceleration > 0.0 {
            // Rescale the ramp position to the new acceleration
            self.n = (self.n as f32 * (self.acceleration / acceleration)) as i64;
        }
        self.c0 = 0.676 * sqrtf(2.0 / acceleration) * 1_000_000.0;
        self.acceleration = acceleration;
        self.compute_new_speed();
    }
}

impl<STEP, DIR, EN> MotionPrimitive for AccelStepper<STEP, DIR, EN>
where
    STEP: OutputPin,
    DIR: OutputPin,
    EN: OutputPin,
{
    fn move_relative(&mut self, steps: i64) {
        self.move_to(self.current + steps);
    }

    fn stop(&mut self) {
        if self.speed != 0.0 {
            let steps_to_stop = self.steps_to_stop() + 1;
            if self.speed > 0.0 {
                self.move_to(self.current + steps_to_stop);
            } else {
                self.move_to(self.current - steps_to_stop);
            }
        }
    }

    fn current_position(&self) -> i64 {
        self.current
    }

    fn set_current_position(&mut self, position: i64) {
        self.current = position;
        self.target = position;
        self.n = 0;
        self.step_interval_us = 0;
        self.speed = 0.0;
    }

    fn distance_to_go(&self) -> i64 {
        self.target - self.current
    }

    fn speed(&self) -> f32 {
        self.speed
    }

    fn set_max_speed(&mut self, speed: f32) {
        self.apply_max_speed(speed);
    }

    fn set_acceleration(&mut self, acceleration: f32) {
        self.apply_acceleration(acceleration);
    }

    fn set_enabled(&mut self, enabled: bool) {
        // Active low
        self.enable_pin.set_state(PinState::from(!enabled)).ok();
    }

    fn run(&mut self, now_us: u64) -> bool {
        if self.step_high {
            self.step_pin.set_low().ok();
            self.step_high = false;
        }
        if self.run_speed(now_us) {
            self.compute_new_speed();
        }
        self.speed != 0.0 || self.distance_to_go() != 0
    }
}
