//! GPIO / peripheral pin assignments for the door monitor board.
//!
//! Single source of truth — `main` references this module rather than
//! hard-coding pin numbers.  The esp-idf-hal peripheral singletons are
//! typed per pin, so these constants document the wiring and are checked
//! against the `peripherals.pins.gpioN` fields used at boot.

// ---------------------------------------------------------------------------
// Door contact (reed switch to GND, internal pull-up)
// ---------------------------------------------------------------------------

/// Digital input: HIGH = contact open (door open), LOW = contact closed.
pub const DOOR_CONTACT_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// BOOT button (active-low, on-board pull-up)
// ---------------------------------------------------------------------------

/// Held low for the debounce window to request an orderly stop.
pub const STOP_BUTTON_GPIO: i32 = 0;

// ---------------------------------------------------------------------------
// Status LED (discrete RGB, common cathode)
// ---------------------------------------------------------------------------

pub const LED_R_GPIO: i32 = 25;
pub const LED_G_GPIO: i32 = 26;
pub const LED_B_GPIO: i32 = 27;

/// LEDC frequency for the RGB status LED (1 kHz).
pub const LED_PWM_FREQ_HZ: u32 = 1_000;
