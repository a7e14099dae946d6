//! Circular position model
//!
//! The stage wraps around every [`MAX_STEP`] steps. The motion primitive
//! keeps an unbounded raw counter; everything user-facing is normalized
//! into `0..MAX_STEP`.

use pld_protocol::{MoveKind, Rejection, SLOT_COUNT};

pub use crate::config::MAX_STEP;

/// Wrap a raw step counter into `0..MAX_STEP`
pub fn normalize(raw: i64) -> u16 {
    // rem_euclid never returns a negative remainder
    raw.rem_euclid(i64::from(MAX_STEP)) as u16
}

/// Shortest strictly-forward distance from `current` to `target`
///
/// Both arguments must already be normalized. The result is in
/// `0..MAX_STEP`; the stage never reverses.
pub fn forward_steps(current: u16, target: u16) -> u16 {
    if target >= current {
        target - current
    } else {
        MAX_STEP - current + target
    }
}

/// Validate an absolute target position
pub fn check_target(target: i32) -> Result<u16, Rejection> {
    if (0..i32::from(MAX_STEP)).contains(&target) {
        Ok(target as u16)
    } else {
        Err(Rejection::PositionOutOfRange)
    }
}

/// Label of the outstanding targeted move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MoveIntent {
    #[default]
    None,
    Load,
    Goto,
}

impl MoveIntent {
    /// Acknowledgment label, `None` when no targeted move is outstanding
    pub fn label(self) -> Option<MoveKind> {
        match self {
            MoveIntent::None => None,
            MoveIntent::Load => Some(MoveKind::Load),
            MoveIntent::Goto => Some(MoveKind::Goto),
        }
    }
}

/// The six saved-position slots, addressed 1-based
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SavedPositions {
    slots: [u16; SLOT_COUNT],
}

impl SavedPositions {
    /// Seed the table; values are normalized on the way in
    pub fn new(initial: [u16; SLOT_COUNT]) -> Self {
        Self {
            slots: initial.map(|p| normalize(i64::from(p))),
        }
    }

    fn index(slot: i32) -> Result<usize, Rejection> {
        if (1..=SLOT_COUNT as i32).contains(&slot) {
            Ok((slot - 1) as usize)
        } else {
            Err(Rejection::InvalidSlot)
        }
    }

    /// Position stored in a slot
    pub fn get(&self, slot: i32) -> Result<u16, Rejection> {
        Ok(self.slots[Self::index(slot)?])
    }

    /// Overwrite a slot
    pub fn set(&mut self, slot: i32, position: u16) -> Result<(), Rejection> {
        let index = Self::index(slot)?;
        self.slots[index] = normalize(i64::from(position));
        Ok(())
    }

    /// `(slot, position)` pairs, 1-based
    pub fn iter(&self) -> impl Iterator<Item = (u8, u16)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, &p)| (i as u8 + 1, p))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_wraps_negative() {
        assert_eq!(normalize(0), 0);
        assert_eq!(normalize(1600), 0);
        assert_eq!(normalize(1601), 1);
        assert_eq!(normalize(-1), 1599);
        assert_eq!(normalize(-1600), 0);
        assert_eq!(normalize(-3201), 1599);
    }

    #[test]
    fn test_forward_steps() {
        assert_eq!(forward_steps(0, 800), 800);
        assert_eq!(forward_steps(800, 800), 0);
        assert_eq!(forward_steps(1500, 100), 200);
        assert_eq!(forward_steps(1, 0), 1599);
    }

    #[test]
    fn test_check_target_range() {
        assert_eq!(check_target(0), Ok(0));
        assert_eq!(check_target(1599), Ok(1599));
        assert_eq!(check_target(1600), Err(Rejection::PositionOutOfRange));
        assert_eq!(check_target(-1), Err(Rejection::PositionOutOfRange));
    }

    #[test]
    fn test_saved_positions_slots() {
        let mut saved = SavedPositions::new([0, 267, 533, 800, 1067, 1333]);
        assert_eq!(saved.get(1), Ok(0));
        assert_eq!(saved.get(6), Ok(1333));
        assert_eq!(saved.get(0), Err(Rejection::InvalidSlot));
        assert_eq!(saved.get(7), Err(Rejection::InvalidSlot));

        assert_eq!(saved.set(3, 42), Ok(()));
        assert_eq!(saved.get(3), Ok(42));
        assert_eq!(saved.set(-2, 42), Err(Rejection::InvalidSlot));

        let slots: heapless::Vec<(u8, u16), 6> = saved.iter().collect();
        assert_eq!(slots[2], (3, 42));
        assert_eq!(slots[5], (6, 1333));
    }

    #[test]
    fn test_intent_labels() {
        assert_eq!(MoveIntent::None.label(), None);
        assert_eq!(MoveIntent::Load.label(), Some(MoveKind::Load));
        assert_eq!(MoveIntent::Goto.label(), Some(MoveKind::Goto));
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(raw in any::<i64>()) {
            let once = normalize(raw);
            prop_assert!(once < MAX_STEP);
            prop_assert_eq!(normalize(i64::from(once)), once);
        }

        #[test]
        fn forward_steps_land_on_target(p1 in 0..MAX_STEP, p2 in 0..MAX_STEP) {
            let steps = forward_steps(p1, p2);
            prop_assert!(steps < MAX_STEP);
            prop_assert_eq!(normalize(i64::from(p1) + i64::from(steps)), p2);
        }

        #[test]
        fn forward_steps_from_any_raw_counter(raw in -1_000_000i64..1_000_000, target in 0..MAX_STEP) {
            let steps = forward_steps(normalize(raw), target);
            prop_assert_eq!(normalize(raw + i64::from(steps)), target);
        }
    }
}
