//! Control laws.

pub mod hysteresis;
