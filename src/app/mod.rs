//! Application core — pure domain logic, zero I/O.
//!
//! Door monitoring, remote-command dispatch and reconnection policy.
//! All interaction with hardware and the network happens through **port
//! traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod dispatcher;
pub mod events;
pub mod ports;
pub mod service;
