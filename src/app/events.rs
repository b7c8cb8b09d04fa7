//! Outbound application events.
//!
//! The [`RegulatorService`](super::service::RegulatorService) emits these
//! through the [`EventSink`](super::ports::EventSink) port. Adapters on
//! the other side decide what to do with them.

use crate::config::{FieldRejection, RegulatorConfig};
use crate::control::hysteresis::DumpState;
use crate::error::{ActuatorError, SensorError};

use super::ports::ConfigError;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The regulator has started with this configuration.
    Started { config: RegulatorConfig },

    /// The decided dump-load state changed.
    DumpLoadChanged {
        from: DumpState,
        to: DumpState,
        bus_voltage: f32,
    },

    /// A tick could not read the bus; the previous decision is held.
    SensorDegraded(SensorError),

    /// The bus is readable again after a degraded stretch.
    SensorRecovered,

    /// The dump-load switch did not accept a write.
    ActuatorFault(ActuatorError),

    /// A configuration update was applied.
    ConfigApplied {
        config: RegulatorConfig,
        rejected: usize,
        first_rejection: Option<FieldRejection>,
        persisted: bool,
    },

    /// Persisting the configuration failed; the live copy still applies.
    ConfigSaveFailed(ConfigError),

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),
}

/// A point-in-time telemetry snapshot suitable for logging or transmission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TelemetryData {
    pub tick: u64,
    pub bus_voltage: f32,
    pub current: f32,
    pub power_w: f32,
    pub dump: DumpState,
    pub manual_override: bool,
    pub degraded: bool,
}
