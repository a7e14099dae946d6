//! Motion primitive trait
//!
//! Abstracts an acceleration-limited step generator. The primitive owns the
//! raw (unbounded) step counter; the coordinator only ever reads it back and
//! normalizes it.

/// Asynchronous single-axis motion service
///
/// Implementations must not block: a move is only started by
/// [`move_relative`](MotionPrimitive::move_relative) and is advanced by
/// repeated calls to [`run`](MotionPrimitive::run) from the control loop.
pub trait MotionPrimitive {
    /// Start a move of `steps` relative to the current position
    ///
    /// Replaces any outstanding target.
    fn move_relative(&mut self, steps: i64);

    /// Decelerate to a stop as quickly as the acceleration allows
    fn stop(&mut self);

    /// Raw accumulated step counter
    fn current_position(&self) -> i64;

    /// Redefine the current position; also cancels any outstanding move
    fn set_current_position(&mut self, position: i64);

    /// Steps remaining to the current target
    fn distance_to_go(&self) -> i64;

    /// Instantaneous speed in steps/s (signed)
    fn speed(&self) -> f32;

    /// Set the speed limit in steps/s
    fn set_max_speed(&mut self, speed: f32);

    /// Set the acceleration in steps/s²
    fn set_acceleration(&mut self, acceleration: f32);

    /// Energize or release the driver
    fn set_enabled(&mut self, enabled: bool);

    /// Do at most one step if one is due at `now_us`
    ///
    /// Returns `true` while the axis is still moving.
    fn run(&mut self, now_us: u64) -> bool;
}
