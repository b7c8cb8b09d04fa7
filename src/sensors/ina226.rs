//! TI INA226 bus-voltage / current monitor driver.
//!
//! Bus voltage is read directly (1.25 mV/LSB, 36 V full scale). Current
//! is derived from the shunt voltage register (2.5 µV/LSB) and the shunt
//! resistance, so the calibration register is left at its reset value.
//!
//! Generic over [`embedded_hal::i2c::I2c`]: on ESP-IDF the bus is an
//! `I2cDriver`, on the host a test double.

use embedded_hal::i2c::{Error as _, I2c};
use log::{debug, info};

use super::Sample;
use crate::error::SensorError;

/// Default 7-bit address (A0 = A1 = GND).
pub const DEFAULT_ADDRESS: u8 = 0x40;

const REG_CONFIG: u8 = 0x00;
const REG_SHUNT_VOLTAGE: u8 = 0x01;
const REG_BUS_VOLTAGE: u8 = 0x02;
const REG_MANUFACTURER_ID: u8 = 0xFE;

/// "TI" in ASCII.
const MANUFACTURER_TI: u16 = 0x5449;

/// 16-sample averaging, 1.1 ms conversion for both channels,
/// continuous shunt + bus mode.
const CONFIG_CONTINUOUS_AVG16: u16 = 0x4527;

const BUS_LSB_VOLTS: f32 = 0.001_25;
const SHUNT_LSB_VOLTS: f32 = 0.000_002_5;

/// Driver for a single INA226 on the bus.
pub struct Ina226<I2C> {
    i2c: I2C,
    address: u8,
    shunt_ohms: f32,
}

impl<I2C: I2c> Ina226<I2C> {
    pub fn new(i2c: I2C, address: u8, shunt_ohms: f32) -> Self {
        Self {
            i2c,
            address,
            shunt_ohms,
        }
    }

    /// Verify the device identity and start continuous conversion.
    ///
    /// Called once at boot; a failure here means the regulator has no
    /// trustworthy voltage source and must not start.
    pub fn probe(&mut self) -> Result<(), SensorError> {
        let id = self.read_register(REG_MANUFACTURER_ID)?;
        if id != MANUFACTURER_TI {
            return Err(SensorError::NotDetected);
        }
        self.write_register(REG_CONFIG, CONFIG_CONTINUOUS_AVG16)?;
        info!(
            "INA226 at 0x{:02X}: continuous mode, shunt {} mΩ",
            self.address,
            self.shunt_ohms * 1000.0
        );
        Ok(())
    }

    /// Bus voltage in volts.
    pub fn bus_voltage(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_BUS_VOLTAGE)?;
        Ok(f32::from(raw) * BUS_LSB_VOLTS)
    }

    /// Shunt current in amps (signed).
    pub fn current(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_register(REG_SHUNT_VOLTAGE)? as i16;
        Ok(f32::from(raw) * SHUNT_LSB_VOLTS / self.shunt_ohms)
    }

    /// Read voltage and current together.
    pub fn read_sample(&mut self) -> Result<Sample, SensorError> {
        let bus_voltage = self.bus_voltage()?;
        let current = self.current()?;
        Sample {
            bus_voltage,
            current,
        }
        .checked()
    }

    /// Release the bus.
    pub fn release(self) -> I2C {
        self.i2c
    }

    fn read_register(&mut self, reg: u8) -> Result<u16, SensorError> {
        let mut buf = [0u8; 2];
        self.i2c
            .write_read(self.address, &[reg], &mut buf)
            .map_err(|e| {
                debug!("INA226 read 0x{:02X} failed: {:?}", reg, e.kind());
                SensorError::BusError
            })?;
        Ok(u16::from_be_bytes(buf))
    }

    fn write_register(&mut self, reg: u8, value: u16) -> Result<(), SensorError> {
        let [hi, lo] = value.to_be_bytes();
        self.i2c.write(self.address, &[reg, hi, lo]).map_err(|e| {
            debug!("INA226 write 0x{:02X} failed: {:?}", reg, e.kind());
            SensorError::BusError
        })
    }
}
