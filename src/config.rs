//! Regulator configuration parameters
//!
//! The user-tunable thresholds persisted in the config record, plus the
//! compiled-in timing constants. Values can be overridden through the
//! status/config surface and are written back to the persistent region.

use core::fmt;
use core::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

// --- Timing ---

/// Control tick interval (1 Hz).
pub const TICK_INTERVAL_MS: u32 = 1000;
/// How often the main loop wakes to service surface requests.
pub const SERVICE_POLL_MS: u32 = 50;
/// Surface requests handled per loop iteration.
pub const SURFACE_BUDGET_PER_POLL: usize = 4;
/// Telemetry is emitted every N control ticks.
pub const TELEMETRY_INTERVAL_TICKS: u64 = 60;
/// Task watchdog timeout.
pub const WATCHDOG_TIMEOUT_MS: u32 = 10_000;

// --- Plausibility limits ---

/// Accepted range for absorption and float voltages (V).
pub const VOLTAGE_RANGE: RangeInclusive<f32> = 8.0..=80.0;
/// Accepted range for the hysteresis band (V).
pub const HYSTERESIS_RANGE: RangeInclusive<f32> = 0.0..=5.0;

/// Persisted, user-adjustable regulator parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegulatorConfig {
    /// Bus voltage at or above which the dump load engages (V).
    pub absorption_voltage: f32,
    /// Settled target voltage; informational only (V).
    pub float_voltage: f32,
    /// Band below `absorption_voltage` where the dump load holds (V).
    pub hysteresis: f32,
    /// Ignore the bus voltage and use `manual_dump_load`.
    pub manual_override: bool,
    /// Forced dump-load state while `manual_override` is set.
    pub manual_dump_load: bool,
}

impl Default for RegulatorConfig {
    fn default() -> Self {
        // 24 V lead-acid bank
        Self {
            absorption_voltage: 28.8,
            float_voltage: 27.0,
            hysteresis: 0.5,
            manual_override: false,
            manual_dump_load: false,
        }
    }
}

impl RegulatorConfig {
    /// Voltage at or below which the dump load releases.
    pub fn release_voltage(&self) -> f32 {
        self.absorption_voltage - self.hysteresis
    }

    /// Check every numeric field against its plausibility range.
    pub fn validate(&self) -> Result<(), FieldRejection> {
        for field in Field::ALL {
            field.check(field.get(self)).map_err(|reason| FieldRejection { field, reason })?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Field-level validation
// ---------------------------------------------------------------------------

/// The numeric configuration fields that accept updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    AbsorptionVoltage,
    FloatVoltage,
    Hysteresis,
}

impl Field {
    pub const ALL: [Field; 3] = [Self::AbsorptionVoltage, Self::FloatVoltage, Self::Hysteresis];

    /// Name used in logs and surface responses.
    pub fn name(self) -> &'static str {
        match self {
            Self::AbsorptionVoltage => "absorption_voltage",
            Self::FloatVoltage => "float_voltage",
            Self::Hysteresis => "hysteresis",
        }
    }

    /// Key used by the config form.
    pub fn form_key(self) -> &'static str {
        match self {
            Self::AbsorptionVoltage => "abs",
            Self::FloatVoltage => "float",
            Self::Hysteresis => "hyst",
        }
    }

    pub fn range(self) -> RangeInclusive<f32> {
        match self {
            Self::AbsorptionVoltage | Self::FloatVoltage => VOLTAGE_RANGE,
            Self::Hysteresis => HYSTERESIS_RANGE,
        }
    }

    pub fn get(self, config: &RegulatorConfig) -> f32 {
        match self {
            Self::AbsorptionVoltage => config.absorption_voltage,
            Self::FloatVoltage => config.float_voltage,
            Self::Hysteresis => config.hysteresis,
        }
    }

    pub fn set(self, config: &mut RegulatorConfig, value: f32) {
        match self {
            Self::AbsorptionVoltage => config.absorption_voltage = value,
            Self::FloatVoltage => config.float_voltage = value,
            Self::Hysteresis => config.hysteresis = value,
        }
    }

    /// Validate a candidate value for this field.
    ///
    /// Negative hysteresis is reported separately from other range
    /// failures: it would invert the control sense.
    pub fn check(self, value: f32) -> Result<f32, FieldError> {
        if !value.is_finite() {
            return Err(FieldError::NotANumber);
        }
        if self == Self::Hysteresis && value < 0.0 {
            return Err(FieldError::Negative);
        }
        if !self.range().contains(&value) {
            return Err(FieldError::OutOfRange);
        }
        Ok(value)
    }
}

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    /// Not parseable as a finite number.
    NotANumber,
    /// Below zero where only non-negative values make sense.
    Negative,
    /// Outside the plausibility range.
    OutOfRange,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotANumber => write!(f, "not a number"),
            Self::Negative => write!(f, "must not be negative"),
            Self::OutOfRange => write!(f, "out of range"),
        }
    }
}

/// A rejected field together with the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRejection {
    pub field: Field,
    pub reason: FieldError,
}

impl fmt::Display for FieldRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.name(), self.reason)
    }
}
