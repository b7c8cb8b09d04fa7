//! Hysteresis dump-load controller.
//!
//! ```text
//!                 V >= absorption
//!        ┌──────────────────────────────┐
//!        │                              ▼
//!  ┌─────────────┐                ┌──────────┐
//!  │ NOT_DUMPING │                │ DUMPING  │
//!  └─────────────┘                └──────────┘
//!        ▲                              │
//!        └──────────────────────────────┘
//!             V <= absorption - hysteresis
//! ```
//!
//! Between the two thresholds the previous state is held. Manual
//! override bypasses the band entirely. The decision itself is pure; the
//! service applies the result to the switch.

use core::fmt;

use crate::config::RegulatorConfig;

/// The two states of the dump-load state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpState {
    #[default]
    NotDumping,
    Dumping,
}

impl DumpState {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Dumping)
    }
}

impl From<bool> for DumpState {
    fn from(active: bool) -> Self {
        if active { Self::Dumping } else { Self::NotDumping }
    }
}

impl fmt::Display for DumpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotDumping => write!(f, "NOT_DUMPING"),
            Self::Dumping => write!(f, "DUMPING"),
        }
    }
}

/// Compute the next dump-load command.
///
/// Total over every `f32`: a NaN voltage satisfies neither comparison
/// and therefore holds the previous state.
pub fn decide(bus_voltage: f32, config: &RegulatorConfig, previous: bool) -> bool {
    if config.manual_override {
        return config.manual_dump_load;
    }
    if bus_voltage >= config.absorption_voltage {
        true
    } else if bus_voltage <= config.release_voltage() {
        false
    } else {
        previous
    }
}

/// Next command when no trustworthy sample is available this tick.
pub fn hold(config: &RegulatorConfig, previous: bool) -> bool {
    if config.manual_override {
        config.manual_dump_load
    } else {
        previous
    }
}

/// The only state the controller carries between ticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ControlState {
    pub dump_active: bool,
}

impl ControlState {
    /// Power-on state: not dumping.
    pub const INITIAL: Self = Self { dump_active: false };

    pub fn dump_state(self) -> DumpState {
        self.dump_active.into()
    }

    /// Advance one tick with a fresh bus voltage.
    pub fn step(self, bus_voltage: f32, config: &RegulatorConfig) -> Self {
        Self {
            dump_active: decide(bus_voltage, config, self.dump_active),
        }
    }

    /// Advance one tick without a usable sample.
    pub fn step_without_sample(self, config: &RegulatorConfig) -> Self {
        Self {
            dump_active: hold(config, self.dump_active),
        }
    }
}
