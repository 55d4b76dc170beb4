//! DMX512 protocol constants

/// Start code for standard dimmer data
pub const DMX_NULL_START: u8 = 0x00;

/// Number of channel slots in one universe
pub const UNIVERSE_SIZE: usize = 512;

pub const DMX_BAUD: u32 = 250_000;

/// Duration of one bit at [`DMX_BAUD`]
pub const BIT_PERIOD_NS: u32 = 1_000_000_000 / DMX_BAUD;
pub const BIT_PERIOD_MICROS: u64 = 4;

/// Start bit, eight data bits and two stop bits
pub const BITS_PER_SLOT: u32 = 11;

pub const MIN_BREAK_MICROS: u64 = 88;
pub const MIN_MAB_MICROS: u64 = 8;
/// Upper bound for both the break and the mark after break
pub const MAX_BREAK_MICROS: u64 = 1_000_000;
