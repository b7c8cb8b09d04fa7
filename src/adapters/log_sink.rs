//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | tick={} | V={:.2}V I={:.2}A P={:.0}W | dump={} | \
                     override={} | degraded={}",
                    t.tick,
                    t.bus_voltage,
                    t.current,
                    t.power_w,
                    t.dump,
                    t.manual_override,
                    t.degraded,
                );
            }
            AppEvent::DumpLoadChanged {
                from,
                to,
                bus_voltage,
            } => {
                info!("DUMP | {} -> {} at {:.2}V", from, to, bus_voltage);
            }
            AppEvent::SensorDegraded(e) => {
                warn!("SENSOR | degraded: {}", e);
            }
            AppEvent::SensorRecovered => {
                info!("SENSOR | recovered");
            }
            AppEvent::ActuatorFault(e) => {
                warn!("DUMP | actuator fault: {}", e);
            }
            AppEvent::ConfigApplied {
                config,
                rejected,
                first_rejection,
                persisted,
            } => {
                info!(
                    "CONFIG | abs={:.2}V float={:.2}V hyst={:.2}V override={} manual={} | \
                     persisted={} rejected={}",
                    config.absorption_voltage,
                    config.float_voltage,
                    config.hysteresis,
                    config.manual_override,
                    config.manual_dump_load,
                    persisted,
                    rejected,
                );
                if let Some(r) = first_rejection {
                    warn!("CONFIG | first rejection: {}", r);
                }
            }
            AppEvent::ConfigSaveFailed(e) => {
                warn!("CONFIG | save failed: {}", e);
            }
            AppEvent::Started { config } => {
                info!(
                    "START | abs={:.2}V hyst={:.2}V override={}",
                    config.absorption_voltage, config.hysteresis, config.manual_override
                );
            }
        }
    }
}
