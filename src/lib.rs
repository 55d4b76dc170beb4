//! Software DMX512 output
//!
//! DMX512 is sent at 250,000 baud: a break of at least 88 us, a mark after
//! break of at least 8 us, a start code and up to 512 channel bytes, each
//! framed as one start bit, eight data bits (LSB first) and two stop bits.
//!
//! This crate produces that signal on any GPIO with no UART, from a periodic
//! timer interrupt. Every tick sends as many whole slots as fit in a share of
//! the CPU (25% by default) and returns, so a frame is spread over many ticks
//! while the application keeps running in between. Bytes are bit-banged with
//! preemption suppressed for the eleven bit periods they take.
//!
//! ```ignore
//! static UNIVERSE: Universe = Universe::new();
//!
//! // once, at startup
//! let scheduler = Scheduler::new(&UNIVERSE, pin, delay, Config::default())?;
//!
//! // in the timer interrupt, every `Config::tick_period`
//! scheduler.tick();
//!
//! // anywhere in the application
//! UNIVERSE.write(1, 255u8);
//! UNIVERSE.set_max_channel(3);
//! ```
#![cfg_attr(not(test), no_std)]

// Must go first so the other modules see its macros.
mod logger;

mod channels;
mod config;
pub mod consts;
mod error;
mod frame;
mod line;
mod scheduler;
mod transmitter;

pub use channels::Universe;
pub use config::{Config, Timing};
pub use error::{ConfigError, Result};
pub use frame::{FrameCursor, Slot};
pub use line::OutputLine;
pub use scheduler::{Scheduler, TickOutcome, TickReport};
pub use transmitter::{DmxTransmitter, Transmitter};
