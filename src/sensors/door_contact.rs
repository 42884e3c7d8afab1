//! Reed-switch door contact.
//!
//! The reed switch shorts the input to GND while the magnet on the door is
//! close, with the GPIO pull-up enabled:
//!
//! | Door   | Contact | Level |
//! |--------|---------|-------|
//! | closed | closed  | LOW   |
//! | open   | open    | HIGH  |
//!
//! Generic over any `embedded_hal` input so the same driver runs on the
//! esp-idf `PinDriver` and on host-side mock pins.

use embedded_hal::digital::InputPin;

use crate::error::SensorError;

pub struct DoorContact<P> {
    pin: P,
    failures: u32,
}

impl<P: InputPin> DoorContact<P> {
    pub fn new(pin: P) -> Self {
        Self { pin, failures: 0 }
    }

    /// Raw level: `true` when the input is high (contact open).
    pub fn read(&mut self) -> Result<bool, SensorError> {
        self.pin.is_high().map_err(|_| {
            self.failures = self.failures.saturating_add(1);
            SensorError::GpioReadFailed
        })
    }

    /// Number of failed GPIO reads since construction.
    pub fn failures(&self) -> u32 {
        self.failures
    }
}
