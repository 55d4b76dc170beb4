//! Output line driver
use embedded_hal::digital::{OutputPin, PinState};

/// The single digital line the DMX signal is written to.
///
/// Setting the level is expected to be one register write. The line is
/// infallible by contract: a pin that can fail must be rejected before it is
/// bound, so HAL errors are dropped here instead of on every bit.
pub struct OutputLine<P> {
    pin: P,
}

impl<P: OutputPin> OutputLine<P> {
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    #[inline(always)]
    pub fn set(&mut self, high: bool) {
        let _ = self.pin.set_state(PinState::from(high));
    }

    #[inline(always)]
    pub fn set_high(&mut self) {
        let _ = self.pin.set_high();
    }

    #[inline(always)]
    pub fn set_low(&mut self) {
        let _ = self.pin.set_low();
    }

    /// Swap the bound pin, returning the old one
    pub fn replace(&mut self, pin: P) -> P {
        core::mem::replace(&mut self.pin, pin)
    }

    pub fn release(self) -> P {
        self.pin
    }
}
