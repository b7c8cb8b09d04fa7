//! Application service, the hexagonal core.
//!
//! [`RegulatorService`] owns the configuration store, the control state
//! and the last good sample. It is the single owner of all mutable
//! regulator state: the tick path and the surface path both go through
//! `&mut self`, so a configuration write and a tick can never interleave.
//!
//! ```text
//!  SampleSource ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                   │    RegulatorService    │
//!  DumpLoadPort ◀── │  store · hysteresis    │
//!                   └────────────────────────┘
//! ```

use log::{error, info, warn};

use crate::config::{RegulatorConfig, TELEMETRY_INTERVAL_TICKS};
use crate::control::hysteresis::ControlState;
use crate::error::Error;
use crate::sensors::Sample;
use crate::store::{ApplyReport, ConfigStore};

use super::commands::ConfigUpdate;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ConfigError, DumpLoadPort, EventSink, SampleSource, StoragePort};
use super::status::StatusView;

// ───────────────────────────────────────────────────────────────
// RegulatorService
// ───────────────────────────────────────────────────────────────

/// What a configuration write did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteOutcome {
    pub report: ApplyReport,
    /// The record was committed to the region by this write.
    pub persisted: bool,
}

/// A configuration write whose save failed. The update is live in
/// memory regardless; `report` says which fields it refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteFailure {
    pub error: ConfigError,
    pub report: ApplyReport,
}

impl core::fmt::Display for WriteFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({} field(s) rejected)", self.error, self.report.rejected.len())
    }
}

/// The application service orchestrates all domain logic.
pub struct RegulatorService<S> {
    store: ConfigStore<S>,
    control: ControlState,
    /// Most recent good reading; reused while the sensor is degraded.
    last_sample: Option<Sample>,
    degraded: bool,
    actuator_fault: bool,
    tick_count: u64,
}

impl<S: StoragePort> RegulatorService<S> {
    /// Wrap an already-loaded store. Control starts in NOT_DUMPING.
    pub fn new(store: ConfigStore<S>) -> Self {
        Self {
            store,
            control: ControlState::INITIAL,
            last_sample: None,
            degraded: false,
            actuator_fault: false,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Take the first reading and drive the switch to the initial state.
    ///
    /// A sensor failure here is fatal to the caller: the regulator must
    /// never serve or act on readings it has not actually taken.
    pub fn start(
        &mut self,
        hw: &mut (impl SampleSource + DumpLoadPort),
        sink: &mut impl EventSink,
    ) -> Result<(), Error> {
        let sample = hw.read_sample().map_err(|e| {
            error!("Startup sensor read failed: {}", e);
            Error::Sensor(e)
        })?;
        self.last_sample = Some(sample);
        hw.set_dump_load(self.control.dump_active)?;

        let config = *self.store.config();
        sink.emit(&AppEvent::Started { config });
        info!(
            "Regulator started at {:.2}V, dump load {}",
            sample.bus_voltage,
            self.control.dump_state()
        );
        Ok(())
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// Run one control cycle: read → decide → re-assert switch.
    ///
    /// The `hw` parameter satisfies **both** [`SampleSource`] and
    /// [`DumpLoadPort`], so one `&mut` reaches both while
    /// keeping the port boundary explicit.
    pub fn tick(
        &mut self,
        hw: &mut (impl SampleSource + DumpLoadPort),
        sink: &mut impl EventSink,
    ) {
        self.tick_count += 1;
        let config = *self.store.config();
        let prev = self.control;

        // 1. Read, classifying failure as its own condition
        match hw.read_sample() {
            Ok(sample) => {
                if self.degraded {
                    self.degraded = false;
                    info!("Sensor recovered at {:.2}V", sample.bus_voltage);
                    sink.emit(&AppEvent::SensorRecovered);
                }
                self.last_sample = Some(sample);
                self.control = prev.step(sample.bus_voltage, &config);
            }
            Err(e) => {
                if !self.degraded {
                    self.degraded = true;
                    warn!("Sensor read failed ({}), holding dump load {}", e, prev.dump_state());
                    sink.emit(&AppEvent::SensorDegraded(e));
                }
                self.control = prev.step_without_sample(&config);
            }
        }

        // 2. Level re-assertion, every tick
        match hw.set_dump_load(self.control.dump_active) {
            Ok(()) => self.actuator_fault = false,
            Err(e) => {
                if !self.actuator_fault {
                    error!("Dump-load write failed: {}", e);
                    sink.emit(&AppEvent::ActuatorFault(e));
                }
                self.actuator_fault = true;
            }
        }

        // 3. Transition event
        if self.control != prev {
            sink.emit(&AppEvent::DumpLoadChanged {
                from: prev.dump_state(),
                to: self.control.dump_state(),
                bus_voltage: self.last_voltage(),
            });
        }

        // 4. Periodic telemetry
        if self.tick_count % TELEMETRY_INTERVAL_TICKS == 0 {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry()));
        }
    }

    // ── Configuration writes ──────────────────────────────────

    /// Apply an update and persist it in one step.
    ///
    /// Saves when something changed or an earlier save is still owed.
    /// A save failure is returned; the live configuration keeps the
    /// applied values either way.
    pub fn write_config(
        &mut self,
        update: &ConfigUpdate,
        sink: &mut impl EventSink,
    ) -> Result<WriteOutcome, WriteFailure> {
        let report = self.store.apply(update);

        let persisted = if report.changed || self.store.is_dirty() {
            if let Err(error) = self.store.save() {
                warn!("Config save failed: {}", error);
                sink.emit(&AppEvent::ConfigSaveFailed(error));
                return Err(WriteFailure { error, report });
            }
            true
        } else {
            false
        };

        sink.emit(&AppEvent::ConfigApplied {
            config: *self.store.config(),
            rejected: report.rejected.len(),
            first_rejection: report.rejected.first().copied(),
            persisted,
        });
        Ok(WriteOutcome { report, persisted })
    }

    // ── Queries ───────────────────────────────────────────────

    /// Current readings and decision, for the status surface.
    pub fn status(&self) -> StatusView {
        let sample = self.last_sample.unwrap_or_default();
        StatusView {
            bus_voltage: sample.bus_voltage,
            current: sample.current,
            dump_active: self.control.dump_active,
            degraded: self.degraded,
            manual_override: self.store.config().manual_override,
        }
    }

    /// Build a telemetry snapshot from the current state.
    pub fn build_telemetry(&self) -> TelemetryData {
        let sample = self.last_sample.unwrap_or_default();
        TelemetryData {
            tick: self.tick_count,
            bus_voltage: sample.bus_voltage,
            current: sample.current,
            power_w: sample.power_watts(),
            dump: self.control.dump_state(),
            manual_override: self.store.config().manual_override,
            degraded: self.degraded,
        }
    }

    pub fn config(&self) -> &RegulatorConfig {
        self.store.config()
    }

    pub fn control_state(&self) -> ControlState {
        self.control
    }

    /// Total control ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn store(&self) -> &ConfigStore<S> {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut ConfigStore<S> {
        &mut self.store
    }

    fn last_voltage(&self) -> f32 {
        self.last_sample.map_or(f32::NAN, |s| s.bus_voltage)
    }
}
