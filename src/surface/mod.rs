//! Status/config surface: form decoding, request routing and the
//! cross-task bridge to the control loop. The HTTP server itself is
//! wired up in the binary.

pub mod channels;
pub mod form;
pub mod handler;
