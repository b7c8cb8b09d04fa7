//! Application core. Pure domain logic, zero I/O.
//!
//! This module contains the business rules of the regulator: tick
//! orchestration, configuration writes and the read-side status view.
//! All interaction with hardware happens through **port traits** defined
//! in [`ports`], keeping this layer fully testable without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
pub mod status;
