//! Homing sensor trait

/// Light-interrupt sensor used as the home reference
pub trait HomingSensor {
    /// `true` while the flag blocks the light path
    fn is_blocked(&mut self) -> bool;
}
