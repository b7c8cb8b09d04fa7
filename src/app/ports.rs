//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ RegulatorService (domain)
//! ```
//!
//! Driven adapters (power monitor, dump-load switch, event sinks,
//! persistent region, clock) implement these traits. The
//! [`RegulatorService`](super::service::RegulatorService) consumes them
//! via generics, so the domain core never touches hardware directly.

use crate::error::{ActuatorError, SensorError};
use crate::sensors::Sample;

// ───────────────────────────────────────────────────────────────
// Sample source (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this once per tick.
pub trait SampleSource {
    /// Take one bus reading. Must return within a bounded time; a
    /// timed-out bus transaction is reported as an error.
    fn read_sample(&mut self) -> Result<Sample, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Dump-load port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: drives the dump-load switch.
pub trait DumpLoadPort {
    /// Set the switch level. Called every tick, changed or not.
    fn set_dump_load(&mut self, active: bool) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port. Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Storage port (driven adapter: domain ↔ persistent region)
// ───────────────────────────────────────────────────────────────

/// A fixed-size, byte-addressable persistent region (EEPROM semantics).
///
/// Writes are staged until [`commit`](StoragePort::commit); only
/// committed bytes survive a power cycle. The config record carries its
/// own digest, so a torn commit is detected on the next load.
pub trait StoragePort {
    /// Size of the region in bytes.
    fn capacity(&self) -> usize;

    /// Fill `buf` from `offset`.
    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError>;

    /// Stage `data` at `offset`.
    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError>;

    /// Make all staged writes durable.
    fn commit(&mut self) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Time port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source for the tick scheduler.
pub trait TimePort {
    /// Milliseconds since boot; never goes backwards.
    fn uptime_ms(&self) -> u64;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from loading or persisting the configuration record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The region is blank (first boot, erased medium).
    NotFound,
    /// Magic, length, digest, or payload check failed.
    Corrupted,
    /// The record was written by an incompatible firmware.
    UnsupportedVersion(u8),
    /// A field failed range validation. Carries the field name.
    ValidationFailed(&'static str),
    /// The record could not be encoded.
    Encoding,
    /// The underlying region failed.
    Storage(StorageError),
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Access past the end of the region.
    OutOfBounds,
    /// Generic I/O error from the backend.
    IoError,
}

impl From<StorageError> for ConfigError {
    fn from(e: StorageError) -> Self {
        Self::Storage(e)
    }
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "config not found"),
            Self::Corrupted => write!(f, "config corrupted"),
            Self::UnsupportedVersion(v) => write!(f, "unsupported record version {}", v),
            Self::ValidationFailed(field) => write!(f, "validation failed: {}", field),
            Self::Encoding => write!(f, "encoding failed"),
            Self::Storage(e) => write!(f, "storage: {}", e),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::OutOfBounds => write!(f, "access out of bounds"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}
