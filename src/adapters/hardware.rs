//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`DoorContact`] and the [`StatusLed`], exposing them through
//! [`SensorPort`] and [`IndicatorPort`].  Generic over the `embedded-hal`
//! pin and PWM traits, so on ESP-IDF it wraps a `PinDriver` plus three
//! `LedcDriver`s and on the host it wraps mocks.

use embedded_hal::digital::InputPin;
use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::app::ports::{IndicatorPort, SensorPort};
use crate::drivers::status_led::StatusLed;
use crate::error::SensorError;
use crate::sensors::door_contact::DoorContact;

/// Concrete adapter that combines the door input and status LED.
pub struct HardwareAdapter<P, C> {
    contact: DoorContact<P>,
    led: StatusLed<C>,
    led_faulted: bool,
}

impl<P: InputPin, C: SetDutyCycle> HardwareAdapter<P, C> {
    pub fn new(contact: DoorContact<P>, led: StatusLed<C>) -> Self {
        Self {
            contact,
            led,
            led_faulted: false,
        }
    }

    pub fn contact(&self) -> &DoorContact<P> {
        &self.contact
    }

    pub fn led(&self) -> &StatusLed<C> {
        &self.led
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<P: InputPin, C: SetDutyCycle> SensorPort for HardwareAdapter<P, C> {
    fn read_contact(&mut self) -> Result<bool, SensorError> {
        self.contact.read()
    }
}

// ── IndicatorPort implementation ──────────────────────────────

impl<P: InputPin, C: SetDutyCycle> IndicatorPort for HardwareAdapter<P, C> {
    fn set_indicator(&mut self, colour: u32) {
        match self.led.set_colour(colour) {
            Ok(()) => self.led_faulted = false,
            Err(e) => {
                // Cosmetic output; report once per fault, never stop the loop.
                if !self.led_faulted {
                    warn!("LED: failed to set #{:06x}: {:?}", colour, e);
                    self.led_faulted = true;
                }
            }
        }
    }
}
