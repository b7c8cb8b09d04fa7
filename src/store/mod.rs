//! Configuration store.
//!
//! Owns the live [`RegulatorConfig`] and mediates load/save against a
//! [`StoragePort`]. The in-memory copy is always the source of truth:
//! a failed save leaves it untouched and marks the store dirty so the
//! next save retries.

pub mod record;

use heapless::Vec;
use log::{info, warn};

use crate::app::commands::ConfigUpdate;
use crate::app::ports::{ConfigError, StorageError, StoragePort};
use crate::config::{Field, FieldRejection, RegulatorConfig};

/// Byte offset of the record inside the persistent region.
pub const RECORD_OFFSET: usize = 0;
/// Size of the persistent region reserved for the regulator.
pub const REGION_SIZE: usize = 64;

/// How the startup load went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A valid record was found and is now live.
    Loaded,
    /// Compiled-in defaults are live; carries why the record was not used.
    Defaults(ConfigError),
}

/// Result of merging a [`ConfigUpdate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// At least one field took a new value.
    pub changed: bool,
    /// Numeric fields that were refused; their prior values remain.
    pub rejected: Vec<FieldRejection, 3>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// The single owner of the live configuration.
pub struct ConfigStore<S> {
    storage: S,
    config: RegulatorConfig,
    dirty: bool,
}

impl<S: StoragePort> ConfigStore<S> {
    /// Wrap a region. The live configuration starts at defaults until
    /// [`load`](Self::load) runs.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            config: RegulatorConfig::default(),
            dirty: false,
        }
    }

    /// Read the record from the region and make it live.
    ///
    /// Never fails: anything short of a valid, in-range record leaves
    /// compiled-in defaults live and reports why.
    pub fn load(&mut self) -> LoadOutcome {
        match self.read_record() {
            Ok(config) => {
                self.config = config;
                self.dirty = false;
                info!(
                    "Config loaded: abs={:.2}V float={:.2}V hyst={:.2}V override={}",
                    config.absorption_voltage,
                    config.float_voltage,
                    config.hysteresis,
                    config.manual_override
                );
                LoadOutcome::Loaded
            }
            Err(e) => {
                self.config = RegulatorConfig::default();
                self.dirty = false;
                match e {
                    ConfigError::NotFound => info!("No stored config, using defaults"),
                    _ => warn!("Stored config unusable ({}), using defaults", e),
                }
                LoadOutcome::Defaults(e)
            }
        }
    }

    fn read_record(&self) -> Result<RegulatorConfig, ConfigError> {
        let mut buf = [0u8; record::RECORD_LEN];
        self.storage.read(RECORD_OFFSET, &mut buf)?;
        let config = record::decode(&buf)?;
        config
            .validate()
            .map_err(|r| ConfigError::ValidationFailed(r.field.name()))?;
        Ok(config)
    }

    /// Merge `update` into the live configuration.
    ///
    /// Each numeric field is checked on its own; a bad value is reported
    /// and the old one kept. Both flags are always taken from the update.
    pub fn apply(&mut self, update: &ConfigUpdate) -> ApplyReport {
        let before = self.config;
        let mut report = ApplyReport::default();

        for field in Field::ALL {
            let Some(value) = update.value(field) else {
                continue;
            };
            match field.check(value) {
                Ok(v) => field.set(&mut self.config, v),
                Err(reason) => {
                    warn!("Rejected {} = {}: {}", field.name(), value, reason);
                    // Capacity equals Field::ALL.len().
                    let _ = report.rejected.push(FieldRejection { field, reason });
                }
            }
        }
        self.config.manual_override = update.manual_override;
        self.config.manual_dump_load = update.manual_dump_load;

        report.changed = self.config != before;
        if report.changed {
            self.dirty = true;
        }
        report
    }

    /// Write the live configuration to the region and commit.
    pub fn save(&mut self) -> Result<(), ConfigError> {
        let bytes = record::encode(&self.config)?;
        if RECORD_OFFSET + bytes.len() > self.storage.capacity() {
            return Err(ConfigError::Storage(StorageError::OutOfBounds));
        }
        self.storage.write(RECORD_OFFSET, &bytes)?;
        self.storage.commit()?;
        self.dirty = false;
        info!("Config saved ({} bytes at offset {})", bytes.len(), RECORD_OFFSET);
        Ok(())
    }

    /// The live configuration.
    pub fn config(&self) -> &RegulatorConfig {
        &self.config
    }

    /// The live configuration differs from what was last persisted.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }
}
