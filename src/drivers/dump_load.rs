//! Dump-load switch driver (MOSFET gate or SSR input).
//!
//! ## Dual-target design
//!
//! Generic over [`embedded_hal::digital::OutputPin`]: on ESP-IDF the pin
//! is a `PinDriver<Output>`, on host a recording test double. The board
//! may invert the gate, so the logical "engaged" level is mapped through
//! [`Polarity`].

use embedded_hal::digital::{Error as _, OutputPin};
use log::warn;

use crate::error::ActuatorError;

/// Which GPIO level diverts power into the load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Polarity {
    #[default]
    ActiveHigh,
    ActiveLow,
}

impl Polarity {
    fn level(self, engaged: bool) -> bool {
        match self {
            Self::ActiveHigh => engaged,
            Self::ActiveLow => !engaged,
        }
    }
}

pub struct DumpLoadSwitch<P> {
    pin: P,
    polarity: Polarity,
    engaged: bool,
}

impl<P: OutputPin> DumpLoadSwitch<P> {
    /// Take the pin and drive it to the released level immediately.
    pub fn new(pin: P, polarity: Polarity) -> Result<Self, ActuatorError> {
        let mut switch = Self {
            pin,
            polarity,
            engaged: false,
        };
        switch.set(false)?;
        Ok(switch)
    }

    /// Drive the switch. Writes the pin on every call, even when the
    /// level is unchanged.
    pub fn set(&mut self, engaged: bool) -> Result<(), ActuatorError> {
        let result = if self.polarity.level(engaged) {
            self.pin.set_high()
        } else {
            self.pin.set_low()
        };
        result.map_err(|e| {
            warn!("Dump-load GPIO write failed: {:?}", e.kind());
            ActuatorError::GpioWriteFailed
        })?;
        self.engaged = engaged;
        Ok(())
    }

    /// Last level successfully written.
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}
