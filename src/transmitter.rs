//! Bit-exact DMX byte transmitter
//!
//! There is no UART behind the line, so every bit is timed by a calibrated
//! delay. A byte is emitted with preemption suppressed and takes exactly
//! eleven bit periods; the break and mark after break only have minimum
//! lengths and are sent with interrupts left alone.
use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, RawMutex};
use embassy_time::Duration;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::config::Config;
use crate::consts::{BITS_PER_SLOT, DMX_NULL_START, UNIVERSE_SIZE};
use crate::line::OutputLine;

/// Start bit low, two stop bits high, data shifted in between
const fn slot_frame(value: u8) -> u16 {
    0b110_0000_0000 | ((value as u16) << 1)
}

fn as_nanos(duration: Duration) -> u32 {
    u32::try_from(duration.as_micros().saturating_mul(1000)).unwrap_or(u32::MAX)
}

/// Software serial transmitter for one output line.
///
/// `M` is the raw mutex used to keep everything else off the CPU while a
/// byte is on the wire. On a target this is a critical section.
pub struct Transmitter<P, D, M = CriticalSectionRawMutex> {
    line: OutputLine<P>,
    delay: D,
    guard: M,
    bit_delay_ns: u32,
    break_ns: u32,
    mab_ns: u32,
}

impl<P: OutputPin, D: DelayNs, M: RawMutex> Transmitter<P, D, M> {
    /// Bind the line and leave it idling high (mark)
    pub fn new(pin: P, delay: D, config: &Config) -> Self {
        let mut line = OutputLine::new(pin);
        line.set_high();
        Self {
            line,
            delay,
            guard: M::INIT,
            bit_delay_ns: config.timing.bit_delay_ns(),
            break_ns: as_nanos(config.break_time),
            mab_ns: as_nanos(config.mark_after_break),
        }
    }

    /// Transmit one slot: start bit, eight data bits LSB first, two stop bits.
    ///
    /// Blocks for eleven bit periods with preemption suppressed.
    pub fn send_byte(&mut self, value: u8) {
        let Self {
            line,
            delay,
            guard,
            bit_delay_ns,
            ..
        } = self;
        let bit_delay = *bit_delay_ns;

        guard.lock(|| {
            let mut frame = slot_frame(value);
            for _ in 0..BITS_PER_SLOT {
                line.set(frame & 1 != 0);
                frame >>= 1;
                delay.delay_ns(bit_delay);
            }
        });
    }

    /// Break, mark after break, then the start code
    pub fn send_reset_sequence(&mut self, start_code: u8) {
        self.hold_break();
        self.send_byte(start_code);
    }

    fn hold_break(&mut self) {
        self.line.set_low();
        self.delay.delay_ns(self.break_ns);
        self.line.set_high();
        self.delay.delay_ns(self.mab_ns);
    }

    /// Bind a different pin. The new line is left idling high.
    pub fn replace_pin(&mut self, pin: P) -> P {
        let old = self.line.replace(pin);
        self.line.set_high();
        old
    }

    pub fn release(self) -> (P, D) {
        (self.line.release(), self.delay)
    }
}

/// A DMX transmitter.
///
/// Sends whole packets synchronously, for callers that own the CPU for the
/// duration of a frame rather than spreading it over timer ticks.
pub trait DmxTransmitter {
    /// Send a break followed by the mark after break.
    fn send_break(&mut self);

    /// Send bytes back to back, without a break.
    fn send_raw_data(&mut self, data: &[u8]);

    /// Send a full packet with the null start code.
    #[inline(always)]
    fn send_dmx_packet(&mut self, channels: &[u8]) {
        self.send_dmx_alt_packet(channels, DMX_NULL_START)
    }

    /// Send a full packet with a non-standard start code.
    ///
    /// Channels past 512 are dropped.
    fn send_dmx_alt_packet(&mut self, channels: &[u8], start: u8) {
        let count = channels.len().min(UNIVERSE_SIZE);
        self.send_break();
        self.send_raw_data(&[start]);
        self.send_raw_data(&channels[..count]);
    }

    /// Send a break followed by `data`, whose first byte is the start code.
    fn send_raw_dmx_packet(&mut self, data: &[u8]) {
        let count = data.len().min(UNIVERSE_SIZE + 1);
        self.send_break();
        self.send_raw_data(&data[..count]);
    }
}

impl<P: OutputPin, D: DelayNs, M: RawMutex> DmxTransmitter for Transmitter<P, D, M> {
    fn send_break(&mut self) {
        self.hold_break();
    }

    fn send_raw_data(&mut self, data: &[u8]) {
        for &value in data {
            self.send_byte(value);
        }
    }
}
