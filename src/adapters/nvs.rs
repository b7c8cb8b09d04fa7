//! NVS-backed persistent region (ESP-IDF only).
//!
//! Presents one NVS blob as a fixed-size [`StoragePort`] region. Reads
//! and writes go to a RAM mirror; [`commit`](StoragePort::commit) stores
//! the whole mirror with `nvs_set_blob` + `nvs_commit`.
//!
//! NVS itself is atomic per commit. The record digest still guards
//! against a blob written by a different layout.

use esp_idf_svc::sys::*;
use log::{info, warn};

use crate::app::ports::{StorageError, StoragePort};

const NAMESPACE: &[u8] = b"dumpload\0";
const BLOB_KEY: &[u8] = b"region\0";

pub struct NvsRegion {
    mirror: Vec<u8>,
}

impl NvsRegion {
    /// Initialise NVS flash and read the region blob into RAM.
    ///
    /// A missing or wrongly sized blob reads back as an erased region
    /// (all `0xFF`), exactly like a fresh EEPROM.
    pub fn open(size: usize) -> Result<Self, StorageError> {
        // SAFETY: nvs_flash_init / nvs_flash_erase are called from the
        // single main-task context before any concurrent NVS access.
        let ret = unsafe { nvs_flash_init() };
        if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
            warn!("NVS: erasing and re-initialising flash partition");
            if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                return Err(StorageError::IoError);
            }
        } else if ret != ESP_OK {
            return Err(StorageError::IoError);
        }

        let mut mirror = vec![0xFF; size];
        let result = with_nvs_handle(false, |handle| {
            let mut len = size;
            let ret = unsafe {
                nvs_get_blob(
                    handle,
                    BLOB_KEY.as_ptr() as *const _,
                    mirror.as_mut_ptr() as *mut _,
                    &mut len,
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(len)
        });

        match result {
            Ok(len) if len == size => info!("NvsRegion: loaded {} bytes", len),
            Ok(len) => {
                warn!("NvsRegion: blob is {} bytes, expected {}; treating as erased", len, size);
                mirror.fill(0xFF);
            }
            Err(e) if e == ESP_ERR_NVS_NOT_FOUND => info!("NvsRegion: no blob yet"),
            Err(e) => {
                warn!("NvsRegion: read error {}; treating as erased", e);
                mirror.fill(0xFF);
            }
        }
        Ok(Self { mirror })
    }

    fn span(&self, offset: usize, len: usize) -> Result<core::ops::Range<usize>, StorageError> {
        let end = offset.checked_add(len).ok_or(StorageError::OutOfBounds)?;
        if end > self.mirror.len() {
            return Err(StorageError::OutOfBounds);
        }
        Ok(offset..end)
    }
}

/// Open the region namespace, run `f` with the handle, then close.
fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
where
    F: FnOnce(nvs_handle_t) -> Result<T, i32>,
{
    let mut handle: nvs_handle_t = 0;
    let mode = if write {
        nvs_open_mode_t_NVS_READWRITE
    } else {
        nvs_open_mode_t_NVS_READONLY
    };

    let ret = unsafe { nvs_open(NAMESPACE.as_ptr() as *const _, mode, &mut handle) };
    if ret != ESP_OK {
        return Err(ret);
    }

    let result = f(handle);
    unsafe {
        nvs_close(handle);
    }
    result
}

impl StoragePort for NvsRegion {
    fn capacity(&self) -> usize {
        self.mirror.len()
    }

    fn read(&self, offset: usize, buf: &mut [u8]) -> Result<(), StorageError> {
        let span = self.span(offset, buf.len())?;
        buf.copy_from_slice(&self.mirror[span]);
        Ok(())
    }

    fn write(&mut self, offset: usize, data: &[u8]) -> Result<(), StorageError> {
        let span = self.span(offset, data.len())?;
        self.mirror[span].copy_from_slice(data);
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StorageError> {
        let mirror = &self.mirror;
        with_nvs_handle(true, |handle| {
            let ret = unsafe {
                nvs_set_blob(
                    handle,
                    BLOB_KEY.as_ptr() as *const _,
                    mirror.as_ptr() as *const _,
                    mirror.len(),
                )
            };
            if ret != ESP_OK {
                return Err(ret);
            }
            let ret = unsafe { nvs_commit(handle) };
            if ret != ESP_OK {
                return Err(ret);
            }
            Ok(())
        })
        .map_err(|e| {
            warn!("NvsRegion: commit error {}", e);
            StorageError::IoError
        })
    }
}
