//! Read-side view served by the status surface.

use serde::Serialize;

/// What `GET /api/status` reports. Derived from the last sample and the
/// control state; never stored independently.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StatusView {
    pub bus_voltage: f32,
    pub current: f32,
    pub dump_active: bool,
    /// The last tick could not read the bus and reused an older sample.
    pub degraded: bool,
    pub manual_override: bool,
}
