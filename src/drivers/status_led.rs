//! RGB status LED driver.
//!
//! Three PWM channels drive discrete R/G/B LEDs (or a common-cathode RGB
//! LED).  Colours are `0xRRGGBB`; each byte becomes that channel's duty
//! cycle as a fraction of 255.
//!
//! ## Dual-target design
//!
//! On ESP-IDF the channels are `LedcDriver`s.  On host/test any
//! `embedded_hal::pwm::SetDutyCycle` mock works.

use embedded_hal::pwm::SetDutyCycle;

pub struct StatusLed<P> {
    channels: [P; 3],
    current: u32,
}

impl<P: SetDutyCycle> StatusLed<P> {
    pub fn new(red: P, green: P, blue: P) -> Self {
        Self {
            channels: [red, green, blue],
            current: 0,
        }
    }

    pub fn set_colour(&mut self, rgb: u32) -> Result<(), P::Error> {
        for (channel, shift) in self.channels.iter_mut().zip([16u32, 8, 0]) {
            let level = ((rgb >> shift) & 0xFF) as u16;
            channel.set_duty_cycle_fraction(level, 0xFF)?;
        }
        self.current = rgb & 0x00FF_FFFF;
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), P::Error> {
        self.set_colour(0)
    }

    /// Last colour written successfully.
    pub fn current_colour(&self) -> u32 {
        self.current
    }
}
