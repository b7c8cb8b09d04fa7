//! GPIO / peripheral pin assignments for the regulator board.
//!
//! Single source of truth; every driver references this module rather than
//! hard-coding pin numbers.  Change a pin here and it propagates everywhere.

use crate::drivers::dump_load::Polarity;

// ---------------------------------------------------------------------------
// Power monitor (INA226 on I2C0)
// ---------------------------------------------------------------------------

pub const I2C_SDA_GPIO: i32 = 8;
pub const I2C_SCL_GPIO: i32 = 9;
/// 400 kHz fast mode.
pub const I2C_BAUD_HZ: u32 = 400_000;
/// Per-transaction timeout; bounds a tick's sensor read.
pub const I2C_TIMEOUT_MS: u32 = 20;

/// Shunt resistor on the battery lead (Ω). 75 mV / 50 A.
pub const SHUNT_OHMS: f32 = 0.0015;

// ---------------------------------------------------------------------------
// Dump load (logic-level MOSFET gate via driver)
// ---------------------------------------------------------------------------

/// Digital output: gate of the dump-load switch.
pub const DUMP_LOAD_GPIO: i32 = 4;
/// The gate driver is non-inverting.
pub const DUMP_LOAD_POLARITY: Polarity = Polarity::ActiveHigh;
