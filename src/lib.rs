//! Dump-load regulator firmware library.
//!
//! Exposes the pure-logic modules for integration testing and for the
//! device binary. All ESP-IDF-specific code is guarded by
//! `#[cfg(feature = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod control;
pub mod error;
pub mod scheduler;
pub mod store;
pub mod surface;

pub mod adapters;
pub mod drivers;
pub mod pins;
pub mod sensors;
