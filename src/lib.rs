//! Doorwatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod fsm;
pub mod pins;
pub mod sensors;
pub mod telemetry;

// Adapters and drivers carry cfg-gated simulation backends, so they build
// and test on the host too.
pub mod adapters;
pub mod drivers;
