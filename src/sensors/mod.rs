//! Sensor subsystem: the bus power monitor and the [`Sample`] it yields
//! each tick.

pub mod ina226;

use crate::error::SensorError;

/// One reading of the DC bus, produced fresh each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Sample {
    /// Battery bus voltage (V).
    pub bus_voltage: f32,
    /// Current through the shunt (A); positive while charging.
    pub current: f32,
}

impl Sample {
    /// Reject readings the controller must not act on.
    pub fn checked(self) -> Result<Self, SensorError> {
        if self.bus_voltage.is_finite() && self.current.is_finite() {
            Ok(self)
        } else {
            Err(SensorError::NonFinite)
        }
    }

    /// Instantaneous power into the bus (W).
    pub fn power_watts(&self) -> f32 {
        self.bus_voltage * self.current
    }
}
