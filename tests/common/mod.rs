//! Virtual clock, recording pin and DMX line decoder for host tests
#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::convert::Infallible;
use std::rc::Rc;

use dmx_softserial::{Scheduler, TickOutcome};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorType, OutputPin};

pub const BIT_NS: u64 = 4000;
/// Default timer period: 510 bit periods
pub const TICK_NS: u64 = 2_040_000;

/// Time only moves when a delay is waited on or the test advances it
#[derive(Clone, Default)]
pub struct Clock(Rc<Cell<u64>>);

impl Clock {
    pub fn now(&self) -> u64 {
        self.0.get()
    }

    pub fn advance(&self, ns: u64) {
        self.0.set(self.0.get() + ns);
    }

    pub fn advance_to(&self, at: u64) {
        assert!(at >= self.now(), "clock would run backwards");
        self.0.set(at);
    }
}

/// Output pin recording every write with its timestamp
#[derive(Clone)]
pub struct Probe {
    clock: Clock,
    writes: Rc<RefCell<Vec<(u64, bool)>>>,
}

impl Probe {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
            writes: Rc::default(),
        }
    }

    pub fn writes(&self) -> Vec<(u64, bool)> {
        self.writes.borrow().clone()
    }

    pub fn write_count(&self) -> usize {
        self.writes.borrow().len()
    }

    /// Times at which the level actually changed
    pub fn edges(&self) -> Vec<(u64, bool)> {
        let mut level = true;
        let mut edges = Vec::new();
        for &(at, high) in self.writes.borrow().iter() {
            if high != level {
                edges.push((at, high));
                level = high;
            }
        }
        edges
    }

    /// Level sampled in the middle of every bit period up to `end`.
    ///
    /// The line idles high before the first write.
    pub fn bits(&self, end: u64) -> Vec<bool> {
        let writes = self.writes.borrow();
        let mut next = 0;
        let mut level = true;
        (0..end / BIT_NS)
            .map(|bit| {
                let at = bit * BIT_NS + BIT_NS / 2;
                while next < writes.len() && writes[next].0 <= at {
                    level = writes[next].1;
                    next += 1;
                }
                level
            })
            .collect()
    }

    /// Every packet on the line so far
    pub fn packets(&self) -> Vec<Packet> {
        decode(&self.bits(self.clock.now()))
    }

    fn record(&self, high: bool) {
        self.writes.borrow_mut().push((self.clock.now(), high));
    }
}

impl ErrorType for Probe {
    type Error = Infallible;
}

impl OutputPin for Probe {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.record(false);
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.record(true);
        Ok(())
    }
}

/// Busy wait that advances the virtual clock
pub struct VirtualDelay {
    clock: Clock,
}

impl VirtualDelay {
    pub fn new(clock: &Clock) -> Self {
        Self {
            clock: clock.clone(),
        }
    }
}

impl DelayNs for VirtualDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.clock.advance(u64::from(ns));
    }
}

/// One break-delimited DMX packet recovered from the line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Offset of the break, in bit periods
    pub at_bit: usize,
    pub break_bits: usize,
    pub mark_bits: usize,
    /// Start code followed by the channels
    pub slots: Vec<u8>,
}

impl Packet {
    pub fn start_code(&self) -> Option<u8> {
        self.slots.first().copied()
    }

    pub fn channels(&self) -> &[u8] {
        self.slots.get(1..).unwrap_or(&[])
    }
}

/// Decode breaks and 8N2 bytes from bit-centre samples.
///
/// A low run of 22 bit periods or more is a break; any shorter low run
/// starts a byte whose stop bits must be high.
pub fn decode(bits: &[bool]) -> Vec<Packet> {
    let mut packets = Vec::new();
    let mut current: Option<Packet> = None;
    let mut i = 0;

    while i < bits.len() {
        if bits[i] {
            i += 1;
            continue;
        }

        let low = bits[i..].iter().take_while(|&&b| !b).count();
        if low >= 22 {
            if let Some(packet) = current.take() {
                packets.push(packet);
            }
            let mark = bits[i + low..].iter().take_while(|&&b| b).count();
            current = Some(Packet {
                at_bit: i,
                break_bits: low,
                mark_bits: mark,
                slots: Vec::new(),
            });
            i += low + mark;
            continue;
        }

        if i + 11 > bits.len() {
            break;
        }
        let mut value = 0u8;
        for k in 0..8 {
            if bits[i + 1 + k] {
                value |= 1 << k;
            }
        }
        assert!(
            bits[i + 9] && bits[i + 10],
            "missing stop bits for byte at bit {i}"
        );
        if let Some(packet) = current.as_mut() {
            packet.slots.push(value);
        }
        i += 11;
    }

    packets.extend(current);
    packets
}

/// Calls `tick` on timer boundaries of the virtual clock
pub struct Ticker {
    clock: Clock,
    period: u64,
    next: u64,
}

impl Ticker {
    pub fn new(clock: &Clock, period: u64) -> Self {
        Self {
            clock: clock.clone(),
            period,
            next: clock.now(),
        }
    }

    /// When the next tick fires
    pub fn next_at(&self) -> u64 {
        self.next
    }

    pub fn tick(&mut self, scheduler: &mut Scheduler<'_, Probe, VirtualDelay>) -> TickOutcome {
        self.clock.advance_to(self.next);
        self.next += self.period;
        let outcome = scheduler.tick();
        assert!(
            self.clock.now() <= self.next,
            "tick overran its period: {} > {}",
            self.clock.now(),
            self.next
        );
        outcome
    }

    pub fn run(
        &mut self,
        scheduler: &mut Scheduler<'_, Probe, VirtualDelay>,
        count: usize,
    ) -> Vec<TickOutcome> {
        (0..count).map(|_| self.tick(scheduler)).collect()
    }

    /// Tick until `frames` frames have completed, returning the tick count
    pub fn run_frames(
        &mut self,
        scheduler: &mut Scheduler<'_, Probe, VirtualDelay>,
        frames: usize,
    ) -> usize {
        let mut ticks = 0;
        let mut done = 0;
        while done < frames {
            ticks += 1;
            assert!(ticks < 100_000, "no frame completed");
            if let TickOutcome::Sent(report) = self.tick(scheduler) {
                if report.frame_complete {
                    done += 1;
                }
            }
        }
        ticks
    }
}
