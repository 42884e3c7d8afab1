//! Sensor subsystem — the door contact driver and its debouncer.

pub mod debounce;
pub mod door_contact;
