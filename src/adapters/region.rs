//! RAM-backed persistent region.
//!
//! Models an EEPROM-style medium: writes land in a staging buffer and
//! only [`commit`](StoragePort::commit) copies them to the durable
//! image. [`reboot`](MemoryRegion::reboot) discards anything staged,
//! which is what a power cycle does to uncommitted bytes.
//!
//! Used by host tests and by simulation builds; the device uses
//! [`NvsRegion`](super::nvs::NvsRegion).

use log::debug;

use crate::app::ports::{StorageError, StoragePort};

#[derive(Debug, Clone)]
pub struct MemoryRegion {
    staged: Vec<u8>,
    durable: Vec<u8>,
    commits: u32,
    fail_writes: bool,
    fail_commits: bool,
}

impl MemoryRegion {
    /// A region as it comes from the factory: every byte `0xFF`.
    pub fn erased(size: usize) -> Self {
        Self::from_bytes(vec![0xFF; size])
    }

    /// A region whose durable image is `bytes`.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self {
            staged: bytes.clone(),
            durable: bytes,
            commits: 0,
            fail_writes: false,
            fail_commits: false,
        }
    }

    /// Drop staged bytes, keeping only what was committed.
    pub fn reboot(&mut self) {
        self.staged.clone_from(&self.durable);
    }

    /// The bytes that would survive a power cycle.
    pub fn durable(&self) -> &[u8] {
        &self.durable
    }

    /// Overwrite part of the durable image directly (fault injection).
    pub fn corrupt(&mut self, offset: usize, bytes: &[u8]) {
        let end = (offset + bytes.len()).min(self.durable.len());
        if offset < end {
            self.durable[offset..end].copy_from_slice(&bytes[..end - offset]);
            self.staged.clone_from(&self.durable);
        }
    }

    /// Number of successful commits so far.
    pub fn commit_count(&self) -> u32 {
        self.commits
    }

    pub fn fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    pub fn fail_commits(&mut self, fail: bool) {
        self.fail_commits = fail;
    }

    fn span(&self, offset: usize, len: usize) -> Result<core::ops::Range<usize>, StorageError> {
        let end = offset.checked_add(len).ok_or(StorageError::OutOfBounds)?;
        if end > self.staged.len() {
            return Err(StorageError::OutOfBounds);
        }
        Ok(offset..end)
    }
}

impl StoragePort for MemoryRegion {
    fn capacity(&self) -> usize {
        self.staged.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let span = self.span(offset, buf.len())?;
        buf.copy_from_slice(&self.staged[span]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        let span = self.span(offset, data.len())?;
        self.staged[span].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        if self.fail_commits {
            return Err(StorageError::IoError);
        }
        self.durable.clone_from(&self.staged);
        self.commits += 1;
        debug!("MemoryRegion: commit #{}", self.commits);
        Ok(())
    }
}
