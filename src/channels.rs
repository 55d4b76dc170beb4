//! Channel buffer and control surface
//!
//! Host code writes channels while the timer interrupt reads them. Nothing
//! here blocks: every channel is a single atomic byte, so the reader sees
//! either the previous or the new value of a slot and never a mix.
use core::sync::atomic::{AtomicBool, AtomicU16, AtomicU8, Ordering};

use crate::consts::UNIVERSE_SIZE;

/// Zero based index for a channel numbered 1..=512
fn slot_index(channel: i32) -> Option<usize> {
    if channel > 0 && channel <= UNIVERSE_SIZE as i32 {
        Some(channel as usize - 1)
    } else {
        None
    }
}

/// The last value written to every channel, and how many of them are sent.
///
/// Shared by reference between host code and the
/// [`Scheduler`](crate::Scheduler); it is `Sync` and can live in a `static`.
pub struct Universe {
    slots: [AtomicU8; UNIVERSE_SIZE],
    /// Highest channel sent in each frame
    max_channel: AtomicU16,
    running: AtomicBool,
    /// Bumped on every start so the scheduler knows to begin a fresh frame
    epoch: AtomicU16,
    ticking: AtomicBool,
}

impl Universe {
    pub const fn new() -> Self {
        Self {
            slots: [const { AtomicU8::new(0) }; UNIVERSE_SIZE],
            max_channel: AtomicU16::new(0),
            running: AtomicBool::new(false),
            epoch: AtomicU16::new(0),
            ticking: AtomicBool::new(false),
        }
    }

    /// Start transmitting. Does nothing if already running.
    pub fn begin(&self) {
        if self.running.load(Ordering::Acquire) {
            return;
        }
        self.epoch.fetch_add(1, Ordering::AcqRel);
        self.running.store(true, Ordering::Release);
        info!("DMX output started, {} channels", self.max_channel());
    }

    /// Stop transmitting and forget the active channel count.
    ///
    /// Channel values are kept.
    pub fn end(&self) {
        self.halt();
        self.max_channel.store(0, Ordering::Release);
    }

    /// Stop transmitting, keeping the active channel count
    pub(crate) fn halt(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("DMX output stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Set `channel` (1..=512) to `value`, starting output if needed.
    ///
    /// Channels outside 1..=512 are ignored. Values are clamped to 0..=255.
    pub fn write(&self, channel: i32, value: impl Into<i32>) {
        self.begin();
        let Some(index) = slot_index(channel) else {
            return;
        };
        let value = value.into().clamp(0, u8::MAX as i32) as u8;
        self.slots[index].store(value, Ordering::Relaxed);
        self.max_channel.fetch_max(channel as u16, Ordering::AcqRel);
    }

    /// Set how many channels each frame carries.
    ///
    /// Zero or less stops output altogether; anything above 512 is capped.
    pub fn set_max_channel(&self, channel: i32) {
        if channel <= 0 {
            self.end();
            return;
        }
        let max = channel.min(UNIVERSE_SIZE as i32) as u16;
        self.max_channel.store(max, Ordering::Release);
        self.begin();
    }

    pub fn max_channel(&self) -> u16 {
        self.max_channel.load(Ordering::Acquire)
    }

    /// Last value written to `channel`, `None` outside 1..=512
    pub fn read(&self, channel: i32) -> Option<u8> {
        slot_index(channel).map(|index| self.slots[index].load(Ordering::Relaxed))
    }

    pub(crate) fn epoch(&self) -> u16 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Claim the right to run a tick, `None` if one is already in flight
    pub(crate) fn enter_tick(&self) -> Option<TickGuard<'_>> {
        self.ticking
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| TickGuard { flag: &self.ticking })
    }
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

/// Held for the duration of a tick
pub(crate) struct TickGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for TickGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
