//! Inbound commands to the application service.
//!
//! A [`ConfigUpdate`] is what the status/config surface hands to
//! [`RegulatorService::write_config`](super::service::RegulatorService::write_config)
//! after decoding a submitted form.

use crate::config::{Field, RegulatorConfig};

/// A partial configuration change.
///
/// Numeric fields are optional: `None` leaves the current value alone.
/// The two flags are always explicit; the form layer decides what an
/// unchecked box means before the update reaches the core.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ConfigUpdate {
    pub absorption_voltage: Option<f32>,
    pub float_voltage: Option<f32>,
    pub hysteresis: Option<f32>,
    pub manual_override: bool,
    pub manual_dump_load: bool,
}

impl ConfigUpdate {
    /// An update that restates every field of `config`.
    pub fn restating(config: &RegulatorConfig) -> Self {
        Self {
            absorption_voltage: Some(config.absorption_voltage),
            float_voltage: Some(config.float_voltage),
            hysteresis: Some(config.hysteresis),
            manual_override: config.manual_override,
            manual_dump_load: config.manual_dump_load,
        }
    }

    /// Flags only; numeric fields untouched.
    pub fn flags(manual_override: bool, manual_dump_load: bool) -> Self {
        Self {
            manual_override,
            manual_dump_load,
            ..Self::default()
        }
    }

    pub fn value(&self, field: Field) -> Option<f32> {
        match field {
            Field::AbsorptionVoltage => self.absorption_voltage,
            Field::FloatVoltage => self.float_voltage,
            Field::Hysteresis => self.hysteresis,
        }
    }

    pub fn set_value(&mut self, field: Field, value: f32) {
        match field {
            Field::AbsorptionVoltage => self.absorption_voltage = Some(value),
            Field::FloatVoltage => self.float_voltage = Some(value),
            Field::Hysteresis => self.hysteresis = Some(value),
        }
    }
}
