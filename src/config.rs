//! Engine tunables
use embassy_time::Duration;

use crate::consts::{
    BITS_PER_SLOT, BIT_PERIOD_MICROS, BIT_PERIOD_NS, MAX_BREAK_MICROS, MIN_BREAK_MICROS,
    MIN_MAB_MICROS,
};
use crate::error::{ConfigError, Result};

/// Calibration of the bit loop against the core clock.
///
/// Writing the line is not free: every bit the transmitter spends
/// `toggle_cycles` core cycles on the register write before it starts the
/// delay. That cost is taken off each bit delay so the bit period stays 4 us
/// whatever the clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Timing {
    pub cpu_hz: u32,
    pub toggle_cycles: u32,
}

impl Timing {
    pub const fn new(cpu_hz: u32, toggle_cycles: u32) -> Self {
        Self {
            cpu_hz,
            toggle_cycles,
        }
    }

    /// Time spent writing the line once, in nanoseconds
    pub fn toggle_overhead_ns(&self) -> u64 {
        if self.cpu_hz == 0 {
            return u64::MAX;
        }
        u64::from(self.toggle_cycles) * 1_000_000_000 / u64::from(self.cpu_hz)
    }

    /// Delay to wait after each line write
    pub fn bit_delay_ns(&self) -> u32 {
        let overhead = u32::try_from(self.toggle_overhead_ns()).unwrap_or(u32::MAX);
        BIT_PERIOD_NS.saturating_sub(overhead)
    }

    fn validate(&self) -> Result<()> {
        if self.toggle_overhead_ns() >= u64::from(BIT_PERIOD_NS) {
            return Err(ConfigError::Uncalibrated {
                cpu_hz: self.cpu_hz,
                toggle_cycles: self.toggle_cycles,
            });
        }
        Ok(())
    }
}

impl Default for Timing {
    fn default() -> Self {
        Self::new(16_000_000, 0)
    }
}

/// Engine configuration.
///
/// The defaults match an AVR at 16 MHz whose Timer2 overflows every
/// 64 * 510 cycles, spending a quarter of every overflow on DMX.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Config {
    /// Period of the platform timer that calls [`Scheduler::tick`](crate::Scheduler::tick)
    pub tick_period: Duration,
    /// Share of each tick spent transmitting
    pub budget_percent: u8,
    pub break_time: Duration,
    pub mark_after_break: Duration,
    pub start_code: u8,
    pub timing: Timing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_period: Duration::from_micros(2040),
            budget_percent: 25,
            break_time: Duration::from_micros(MIN_BREAK_MICROS),
            mark_after_break: Duration::from_micros(MIN_MAB_MICROS),
            start_code: crate::consts::DMX_NULL_START,
            timing: Timing::default(),
        }
    }
}

impl Config {
    /// Bit periods one tick may spend on the line
    pub fn tick_budget(&self) -> u32 {
        let bits = self.tick_period.as_micros() / BIT_PERIOD_MICROS;
        let budget = bits * u64::from(self.budget_percent) / 100;
        u32::try_from(budget).unwrap_or(u32::MAX)
    }

    /// Bit periods taken by break, mark after break and start code
    pub fn break_cost(&self) -> u32 {
        let brk = self.break_time.as_micros().div_ceil(BIT_PERIOD_MICROS);
        let mab = self.mark_after_break.as_micros().div_ceil(BIT_PERIOD_MICROS);
        u32::try_from(brk + mab)
            .unwrap_or(u32::MAX)
            .saturating_add(BITS_PER_SLOT)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tick_period.as_ticks() == 0 {
            return Err(ConfigError::ZeroTickPeriod);
        }
        if self.budget_percent == 0 || self.budget_percent > 100 {
            return Err(ConfigError::BudgetPercent(self.budget_percent));
        }

        let brk = self.break_time.as_micros();
        if !(MIN_BREAK_MICROS..=MAX_BREAK_MICROS).contains(&brk) {
            return Err(ConfigError::BreakOutOfRange(brk));
        }
        let mab = self.mark_after_break.as_micros();
        if !(MIN_MAB_MICROS..=MAX_BREAK_MICROS).contains(&mab) {
            return Err(ConfigError::MarkOutOfRange(mab));
        }

        self.timing.validate()?;

        let budget = self.tick_budget();
        let needed = self.break_cost();
        if budget < needed {
            return Err(ConfigError::BudgetTooSmall { budget, needed });
        }
        Ok(())
    }
}
