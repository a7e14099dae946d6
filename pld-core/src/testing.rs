//! Host-side doubles for the capability traits

use crate::traits::{HomingSensor, LaserIo, LaserLine, MotionPrimitive};

/// Motion primitive that advances one step per `run()` at a fixed speed
#[derive(Debug, Default)]
pub struct MockMotion {
    pub position: i64,
    pub target: i64,
    pub max_speed: f32,
    pub acceleration: f32,
    pub enabled: bool,
    pub moves: heapless::Vec<i64, 16>,
    pub stops: u32,
}

impl MockMotion {
    pub fn new() -> Self {
        Self {
            enabled: true,
            ..Self::default()
        }
    }

    /// Run until the target is reached
    pub fn settle(&mut self) {
        while self.position != self.target {
            self.run(0);
        }
    }
}

impl MotionPrimitive for MockMotion {
    fn move_relative(&mut self, steps: i64) {
        let _ = self.moves.push(steps);
        self.target = self.position + steps;
    }

    fn stop(&mut self) {
        self.stops += 1;
        self.target = self.position;
    }

    fn current_position(&self) -> i64 {
        self.position
    }

    fn set_current_position(&mut self, position: i64) {
        self.position = position;
        self.target = position;
    }

    fn distance_to_go(&self) -> i64 {
        self.target - self.position
    }

    fn speed(&self) -> f32 {
        if self.position == self.target {
            0.0
        } else {
            100.0
        }
    }

    fn set_max_speed(&mut self, speed: f32) {
        self.max_speed = speed;
    }

    fn set_acceleration(&mut self, acceleration: f32) {
        self.acceleration = acceleration;
    }

    fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    fn run(&mut self, _now_us: u64) -> bool {
        match self.target.cmp(&self.position) {
            core::cmp::Ordering::Greater => self.position += 1,
            core::cmp::Ordering::Less => self.position -= 1,
            core::cmp::Ordering::Equal => return false,
        }
        true
    }
}

/// Sensor whose reading is set directly by the test
#[derive(Debug, Default)]
pub struct MockSensor {
    pub blocked: bool,
}

impl HomingSensor for MockSensor {
    fn is_blocked(&mut self) -> bool {
        self.blocked
    }
}

/// Laser outputs that record every write
#[derive(Debug, Default)]
pub struct MockLaser {
    pub pulse: bool,
    pub relay: bool,
    pub speaker: bool,
    pub pulse_edges: u32,
}

impl LaserIo for MockLaser {
    fn set(&mut self, line: LaserLine, high: bool) {
        match line {
            LaserLine::Pulse => {
                if high && !self.pulse {
                    self.pulse_edges += 1;
                }
                self.pulse = high;
            }
            LaserLine::Relay => self.relay = high,
            LaserLine::Speaker => self.speaker = high,
        }
    }

    fn get(&self, line: LaserLine) -> bool {
        match line {
            LaserLine::Pulse => self.pulse,
            LaserLine::Relay => self.relay,
            LaserLine::Speaker => self.speaker,
        }
    }
}
