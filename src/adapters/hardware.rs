//! Hardware adapter: bridges real peripherals to domain port traits.
//!
//! Owns the INA226 and the dump-load switch, exposing them through
//! [`SampleSource`] and [`DumpLoadPort`]. This is the only module that
//! touches actual hardware. Both drivers are generic over embedded-hal
//! traits, so the same adapter runs against ESP-IDF peripherals or
//! host-side doubles.

use embedded_hal::digital::OutputPin;
use embedded_hal::i2c::I2c;

use crate::app::ports::{DumpLoadPort, SampleSource};
use crate::drivers::dump_load::DumpLoadSwitch;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::Sample;
use crate::sensors::ina226::Ina226;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<I2C, P> {
    monitor: Ina226<I2C>,
    switch: DumpLoadSwitch<P>,
}

impl<I2C: I2c, P: OutputPin> HardwareAdapter<I2C, P> {
    pub fn new(monitor: Ina226<I2C>, switch: DumpLoadSwitch<P>) -> Self {
        Self { monitor, switch }
    }

    /// Identify and configure the power monitor.
    pub fn probe(&mut self) -> Result<(), SensorError> {
        self.monitor.probe()
    }

    pub fn is_engaged(&self) -> bool {
        self.switch.is_engaged()
    }
}

// ── SampleSource implementation ───────────────────────────────

impl<I2C: I2c, P: OutputPin> SampleSource for HardwareAdapter<I2C, P> {
    fn read_sample(&mut self) -> Result<Sample, SensorError> {
        self.monitor.read_sample()
    }
}

// ── DumpLoadPort implementation ───────────────────────────────

impl<I2C: I2c, P: OutputPin> DumpLoadPort for HardwareAdapter<I2C, P> {
    fn set_dump_load(&mut self, active: bool) -> Result<(), ActuatorError> {
        self.switch.set(active)
    }
}
