//! Move duration estimates
//!
//! Models a move as a symmetric constant-acceleration trapezoid: ramp up at
//! `acceleration`, cruise at `max_speed`, ramp down. Short moves never reach
//! cruise speed and degenerate to a triangle.

use libm::{ceilf, sqrtf};

/// Trapezoidal velocity profile
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TrapezoidProfile {
    /// Cruise speed in steps/s
    pub max_speed: f32,
    /// Acceleration in steps/s²
    pub acceleration: f32,
}

impl TrapezoidProfile {
    /// Create a profile
    pub fn new(max_speed: f32, acceleration: f32) -> Self {
        Self {
            max_speed,
            acceleration,
        }
    }

    /// Steps needed to reach cruise speed from standstill
    pub fn ramp_steps(&self) -> f32 {
        self.max_speed * self.max_speed / (2.0 * self.acceleration)
    }

    /// Time in seconds to travel `steps` from standstill to standstill
    pub fn duration_s(&self, steps: u32) -> f32 {
        if steps == 0 || self.max_speed <= 0.0 || self.acceleration <= 0.0 {
            return 0.0;
        }
        let steps = steps as f32;
        let ramp = self.ramp_steps();

        if 2.0 * ramp >= steps {
            // Triangle: accelerate over half, decelerate over the other half
            2.0 * sqrtf(steps / self.acceleration)
        } else {
            let ramp_time = self.max_speed / self.acceleration;
            let cruise = steps - 2.0 * ramp;
            2.0 * ramp_time + cruise / self.max_speed
        }
    }

    /// Duration rounded up to whole milliseconds
    pub fn duration_ms(&self, steps: u32) -> u32 {
        ceilf(self.duration_s(steps) * 1000.0) as u32
    }
}
