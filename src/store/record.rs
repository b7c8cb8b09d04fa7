//! Fixed-size on-medium layout of the configuration record.
//!
//! ```text
//!  0      4   5   6                      24              32
//!  ┌──────┬───┬───┬──────────────────────┬───────────────┐
//!  │ WDLR │ v │ n │ postcard payload (n) │ SHA-256[..8]  │
//!  └──────┴───┴───┴──────────────────────┴───────────────┘
//! ```
//!
//! The digest covers bytes `0..24`, so a record torn by a power loss
//! during `commit` is rejected instead of being read back as nonsense.

use crate::app::ports::ConfigError;
use crate::config::RegulatorConfig;

pub const RECORD_LEN: usize = 32;
pub const MAGIC: [u8; 4] = *b"WDLR";
pub const VERSION: u8 = 1;

const VERSION_AT: usize = 4;
const LEN_AT: usize = 5;
const PAYLOAD_AT: usize = 6;
const PAYLOAD_MAX: usize = 18;
const DIGEST_AT: usize = PAYLOAD_AT + PAYLOAD_MAX;
const DIGEST_LEN: usize = RECORD_LEN - DIGEST_AT;

/// Erased flash / EEPROM reads back as all ones.
const BLANK: u8 = 0xFF;

fn digest(body: &[u8]) -> [u8; DIGEST_LEN] {
    let full = hmac_sha256::Hash::hash(body);
    let mut out = [0u8; DIGEST_LEN];
    out.copy_from_slice(&full[..DIGEST_LEN]);
    out
}

/// Serialise `config` into a complete record.
pub fn encode(config: &RegulatorConfig) -> Result<[u8; RECORD_LEN], ConfigError> {
    let mut record = [0u8; RECORD_LEN];
    record[..VERSION_AT].copy_from_slice(&MAGIC);
    record[VERSION_AT] = VERSION;

    let used = postcard::to_slice(config, &mut record[PAYLOAD_AT..DIGEST_AT])
        .map_err(|_| ConfigError::Encoding)?
        .len();
    record[LEN_AT] = used as u8;

    let sum = digest(&record[..DIGEST_AT]);
    record[DIGEST_AT..].copy_from_slice(&sum);
    Ok(record)
}

/// Parse and verify a record. Range validation is the caller's job.
pub fn decode(record: &[u8]) -> Result<RegulatorConfig, ConfigError> {
    if record.len() < RECORD_LEN {
        return Err(ConfigError::Corrupted);
    }
    let record = &record[..RECORD_LEN];

    if record.iter().all(|&b| b == BLANK) {
        return Err(ConfigError::NotFound);
    }
    if record[..VERSION_AT] != MAGIC {
        return Err(ConfigError::Corrupted);
    }
    if digest(&record[..DIGEST_AT])[..] != record[DIGEST_AT..] {
        return Err(ConfigError::Corrupted);
    }
    if record[VERSION_AT] != VERSION {
        return Err(ConfigError::UnsupportedVersion(record[VERSION_AT]));
    }

    let len = record[LEN_AT] as usize;
    if len == 0 || len > PAYLOAD_MAX {
        return Err(ConfigError::Corrupted);
    }
    let payload = &record[PAYLOAD_AT..PAYLOAD_AT + len];
    match postcard::take_from_bytes::<RegulatorConfig>(payload) {
        Ok((config, rest)) if rest.is_empty() => Ok(config),
        _ => Err(ConfigError::Corrupted),
    }
}
