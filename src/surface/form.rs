//! `application/x-www-form-urlencoded` decoding for the config form.
//!
//! Turns a POST body such as `abs=34.0&hyst=0.5&override=on` into a
//! [`ConfigUpdate`]. Checkbox convention: `override` and `manual` are
//! `true` when present (any value) and `false` when absent. Numeric
//! fields that are absent or empty leave the stored value alone; a
//! value that does not parse is reported per field. Unknown keys are
//! ignored, including keys that do not decode, and the last occurrence
//! of a key wins.
//!
//! Everything is decoded into fixed-capacity buffers; no allocation.

use core::fmt;

use heapless::{String, Vec};

use crate::app::commands::ConfigUpdate;
use crate::config::{Field, FieldError, FieldRejection};

/// Largest body accepted.
pub const MAX_FORM_LEN: usize = 256;

const MAX_KEY_LEN: usize = 16;
const MAX_VALUE_LEN: usize = 32;

const KEY_OVERRIDE: &str = "override";
const KEY_MANUAL: &str = "manual";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormError {
    /// Body longer than [`MAX_FORM_LEN`].
    TooLong,
}

impl fmt::Display for FormError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TooLong => write!(f, "form body too long"),
        }
    }
}

/// A decoded form: the update plus fields that failed to parse.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParsedForm {
    pub update: ConfigUpdate,
    pub rejected: Vec<FieldRejection, 3>,
}

fn hex_value(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

/// A `%` not followed by two hex digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct BadEscape;

/// Percent-decode `raw` into `out`. `Ok(false)` means it did not fit.
fn url_decode<const N: usize>(raw: &[u8], out: &mut Vec<u8, N>) -> Result<bool, BadEscape> {
    out.clear();
    let mut i = 0;
    while i < raw.len() {
        let byte = match raw[i] {
            b'+' => b' ',
            b'%' => {
                let hi = raw.get(i + 1).copied().and_then(hex_value);
                let lo = raw.get(i + 2).copied().and_then(hex_value);
                match (hi, lo) {
                    (Some(hi), Some(lo)) => {
                        i += 2;
                        (hi << 4) | lo
                    }
                    _ => return Err(BadEscape),
                }
            }
            b => b,
        };
        if out.push(byte).is_err() {
            return Ok(false);
        }
        i += 1;
    }
    Ok(true)
}

/// Index into [`Field::ALL`] for a form key.
fn slot_for_key(key: &str) -> Option<usize> {
    Field::ALL.iter().position(|f| f.form_key() == key)
}

fn parse_number(raw: &[u8]) -> Result<Option<f32>, FieldError> {
    let mut buf: Vec<u8, MAX_VALUE_LEN> = Vec::new();
    let fits = url_decode(raw, &mut buf).map_err(|_| FieldError::NotANumber)?;
    if !fits {
        return Err(FieldError::NotANumber);
    }
    let text = core::str::from_utf8(&buf).map_err(|_| FieldError::NotANumber)?;
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    text.parse::<f32>().map(Some).map_err(|_| FieldError::NotANumber)
}

/// Decode a config form body.
pub fn parse_config_form(body: &[u8]) -> Result<ParsedForm, FormError> {
    if body.len() > MAX_FORM_LEN {
        return Err(FormError::TooLong);
    }

    // Last occurrence wins, so collect per-field outcomes first.
    let mut numeric: [Option<Result<Option<f32>, FieldError>>; 3] = [None; 3];
    let mut form = ParsedForm::default();
    let mut key_buf: Vec<u8, MAX_KEY_LEN> = Vec::new();

    for pair in body.split(|&b| b == b'&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = match pair.iter().position(|&b| b == b'=') {
            Some(eq) => (&pair[..eq], &pair[eq + 1..]),
            None => (pair, &[][..]),
        };
        // Oversized, badly escaped or non-UTF-8 keys match nothing we know.
        let Ok(true) = url_decode(raw_key, &mut key_buf) else {
            continue;
        };
        let Ok(key) = core::str::from_utf8(&key_buf) else {
            continue;
        };

        match key {
            KEY_OVERRIDE => form.update.manual_override = true,
            KEY_MANUAL => form.update.manual_dump_load = true,
            _ => {
                if let Some(slot) = slot_for_key(key) {
                    numeric[slot] = Some(parse_number(raw_value));
                }
            }
        }
    }

    for (field, outcome) in Field::ALL.into_iter().zip(numeric) {
        match outcome {
            Some(Ok(Some(value))) => form.update.set_value(field, value),
            Some(Err(reason)) => {
                // One slot per field; cannot overflow.
                let _ = form.rejected.push(FieldRejection { field, reason });
            }
            Some(Ok(None)) | None => {}
        }
    }
    Ok(form)
}

/// Render `rejections` as a comma-separated list of field names.
pub fn rejected_names(rejections: &[FieldRejection]) -> String<64> {
    let mut out = String::new();
    for (i, r) in rejections.iter().enumerate() {
        if i > 0 {
            let _ = out.push_str(",");
        }
        let _ = out.push_str(r.field.form_key());
    }
    out
}
