//! Mock hardware adapter for integration tests.
//!
//! Plays back a scripted sequence of bus readings and records every
//! dump-load write, so tests can assert on the full command history
//! without touching real I2C or GPIO.

use std::collections::VecDeque;

use dumpload::app::events::AppEvent;
use dumpload::app::ports::{DumpLoadPort, EventSink, SampleSource};
use dumpload::error::{ActuatorError, SensorError};
use dumpload::sensors::Sample;

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    script: VecDeque<Result<Sample, SensorError>>,
    /// Every level written to the switch, in order.
    pub writes: Vec<bool>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            script: VecDeque::new(),
            writes: Vec::new(),
            fail_writes: false,
        }
    }

    /// Queue readings at the given voltages (1 A each).
    pub fn with_voltages(volts: &[f32]) -> Self {
        let mut hw = Self::new();
        for &v in volts {
            hw.push_voltage(v);
        }
        hw
    }

    pub fn push_voltage(&mut self, bus_voltage: f32) {
        self.script.push_back(Ok(Sample {
            bus_voltage,
            current: 1.0,
        }));
    }

    pub fn push_failure(&mut self, e: SensorError) {
        self.script.push_back(Err(e));
    }

    pub fn last_write(&self) -> Option<bool> {
        self.writes.last().copied()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleSource for MockHardware {
    fn read_sample(&mut self) -> Result<Sample, SensorError> {
        // An exhausted script behaves like an unplugged monitor.
        self.script.pop_front().unwrap_or(Err(SensorError::BusError))
    }
}

impl DumpLoadPort for MockHardware {
    fn set_dump_load(&mut self, active: bool) -> Result<(), ActuatorError> {
        if self.fail_writes {
            return Err(ActuatorError::GpioWriteFailed);
        }
        self.writes.push(active);
        Ok(())
    }
}

// ── LogSink ───────────────────────────────────────────────────

/// Collects every emitted event.
#[derive(Default)]
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
