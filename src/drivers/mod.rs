//! Output drivers: status LED and task watchdog.

pub mod status_led;
pub mod watchdog;
