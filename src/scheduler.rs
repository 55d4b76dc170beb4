//! Time-budgeted scheduler
//!
//! A frame of 512 channels takes over 22 ms on the wire, far longer than a
//! timer tick. Each tick spends a fixed share of the bit periods that elapsed
//! since the previous one, sends as many whole slots as fit, and leaves the
//! cursor where it stopped for the next tick to pick up.
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::channels::Universe;
use crate::config::Config;
use crate::error::Result;
use crate::frame::{FrameCursor, Slot};
use crate::transmitter::Transmitter;

/// What one tick put on the line
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TickReport {
    /// Slots sent, a reset sequence counting as one
    pub slots: u16,
    /// Bit periods those slots were budgeted
    pub bit_periods: u32,
    /// The tick ended on the last slot of a frame
    pub frame_complete: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickOutcome {
    /// Another tick was still in flight; nothing was sent
    Reentrant,
    /// Output is stopped
    Stopped,
    Sent(TickReport),
}

/// Drives one [`Universe`] onto one output line.
///
/// Call [`tick`](Self::tick) from the platform timer interrupt once every
/// [`Config::tick_period`].
pub struct Scheduler<'a, P, D, M = CriticalSectionRawMutex> {
    universe: &'a Universe,
    transmitter: Transmitter<P, D, M>,
    cursor: FrameCursor,
    /// Start epoch the cursor belongs to
    epoch: u16,
    budget: u32,
    break_cost: u32,
    start_code: u8,
}

impl<'a, P: OutputPin, D: DelayNs, M: RawMutex> Scheduler<'a, P, D, M> {
    /// Bind `pin` and check that `config` lets the engine make progress.
    pub fn new(universe: &'a Universe, pin: P, delay: D, config: Config) -> Result<Self> {
        if let Err(err) = config.validate() {
            error!("DMX configuration rejected: {}", err);
            return Err(err);
        }

        debug!(
            "DMX scheduler: {} bit periods per tick, {} per break",
            config.tick_budget(),
            config.break_cost()
        );

        Ok(Self {
            universe,
            transmitter: Transmitter::new(pin, delay, &config),
            cursor: FrameCursor::new(),
            epoch: universe.epoch(),
            budget: config.tick_budget(),
            break_cost: config.break_cost(),
            start_code: config.start_code,
        })
    }

    /// Send the next chunk of the current frame.
    ///
    /// Never sends a slot that would overrun the tick budget, and ends early
    /// once a frame is complete so breaks are at least one tick apart.
    pub fn tick(&mut self) -> TickOutcome {
        let Some(_guard) = self.universe.enter_tick() else {
            warn!("DMX tick re-entered, skipping");
            return TickOutcome::Reentrant;
        };

        if !self.universe.is_running() {
            return TickOutcome::Stopped;
        }

        let epoch = self.universe.epoch();
        if epoch != self.epoch {
            self.epoch = epoch;
            self.cursor.reset();
        }

        let mut bits_left = self.budget;
        let mut report = TickReport::default();

        loop {
            let active = self.universe.max_channel();
            let slot = self.cursor.next_slot(active);
            let cost = slot.cost(self.break_cost);
            if cost > bits_left {
                break;
            }
            bits_left -= cost;

            match slot {
                Slot::Break => self.transmitter.send_reset_sequence(self.start_code),
                Slot::Channel(channel) => {
                    let value = self.universe.read(i32::from(channel)).unwrap_or(0);
                    self.transmitter.send_byte(value);
                }
            }
            report.slots += 1;
            report.bit_periods += cost;

            if self.cursor.advance(active) {
                trace!("DMX frame complete, {} channels", active);
                report.frame_complete = true;
                break;
            }
        }

        TickOutcome::Sent(report)
    }

    /// Move output to another pin, returning the one previously bound.
    ///
    /// A running engine is stopped and started again around the swap, so
    /// the new line begins with a break.
    pub fn select_output_line(&mut self, pin: P) -> P {
        let was_running = self.universe.is_running();
        if was_running {
            self.universe.halt();
        }

        let old = self.transmitter.replace_pin(pin);
        info!("DMX output line rebound");

        if was_running {
            self.universe.begin();
        }
        old
    }

    pub fn universe(&self) -> &'a Universe {
        self.universe
    }

    pub fn cursor(&self) -> FrameCursor {
        self.cursor
    }

    /// Bit periods available to each tick
    pub fn budget(&self) -> u32 {
        self.budget
    }

    pub fn release(self) -> (P, D) {
        self.transmitter.release()
    }
}
