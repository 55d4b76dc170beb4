//! Error types for engine configuration
use thiserror::Error;

/// Reasons a [`Config`](crate::Config) cannot drive the engine.
///
/// These are reported once when the scheduler is built; a running engine
/// has no failure modes of its own.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// The timer period is zero
    #[error("tick period must be non-zero")]
    ZeroTickPeriod,

    /// CPU share outside 1..=100
    #[error("cpu budget must be between 1 and 100 percent, got {0}")]
    BudgetPercent(u8),

    /// Break length in microseconds
    #[error("break of {0} us is outside 88 us ..= 1 s")]
    BreakOutOfRange(u64),

    /// Mark-after-break length in microseconds
    #[error("mark after break of {0} us is outside 8 us ..= 1 s")]
    MarkOutOfRange(u64),

    /// Core clock is zero or too slow to toggle the line within one bit period
    #[error("cpu clock of {cpu_hz} Hz cannot toggle the line in {toggle_cycles} cycles per bit")]
    Uncalibrated { cpu_hz: u32, toggle_cycles: u32 },

    /// The timer never leaves enough bit periods to send a reset sequence
    #[error("tick budget of {budget} bit periods cannot fit a {needed} bit period break sequence")]
    BudgetTooSmall { budget: u32, needed: u32 },
}

/// Result type for engine setup
pub type Result<T> = core::result::Result<T, ConfigError>;
