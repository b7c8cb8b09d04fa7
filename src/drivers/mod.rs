//! Actuator drivers and peripheral helpers.

pub mod dump_load;
pub mod watchdog;
