//! Frame state machine
//!
//! A frame is a break (with its mark and start code) followed by the active
//! channels in order. The cursor only ever moves forward one slot at a time
//! and wraps to the break once the last active channel is out.
use crate::consts::BITS_PER_SLOT;

/// Next thing to put on the line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Slot {
    /// Break, mark after break and start code
    Break,
    /// One channel, numbered from 1
    Channel(u16),
}

impl Slot {
    /// Bit periods this slot occupies, given the cost of a reset sequence
    pub fn cost(&self, break_cost: u32) -> u32 {
        match self {
            Slot::Break => break_cost,
            Slot::Channel(_) => BITS_PER_SLOT,
        }
    }
}

/// Position within the frame being transmitted.
///
/// 0 means the break is next, `k` means channel `k` is next.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FrameCursor {
    position: u16,
}

impl FrameCursor {
    pub const fn new() -> Self {
        Self { position: 0 }
    }

    pub fn position(&self) -> u16 {
        self.position
    }

    /// Slot to send next when `active` channels make up the frame.
    ///
    /// A cursor left past the end by a shrinking channel count starts a new
    /// frame instead of sending a channel that is no longer active.
    pub fn next_slot(&self, active: u16) -> Slot {
        if self.position == 0 || self.position > active {
            Slot::Break
        } else {
            Slot::Channel(self.position)
        }
    }

    /// Step past the slot returned by [`next_slot`](Self::next_slot).
    ///
    /// Returns `true` when that slot was the last of the frame.
    pub fn advance(&mut self, active: u16) -> bool {
        if self.position > active {
            self.position = 0;
        }
        self.position += 1;
        if self.position > active {
            self.position = 0;
            return true;
        }
        false
    }

    pub fn reset(&mut self) {
        self.position = 0;
    }
}
