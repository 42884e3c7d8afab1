//! Fuzz target: debouncer and door state machine
//!
//! Each input byte is one raw sample: bit 7 is the contact level, the low
//! bits the milliseconds since the previous sample.  Verifies:
//! - No panics for any sample sequence
//! - A stable report always follows a full quiet window
//! - The state machine only reports real edges
//!
//! cargo fuzz run fuzz_debounce

#![no_main]

use doorwatch::fsm::DoorFsm;
use doorwatch::sensors::debounce::DebounceDetector;
use libfuzzer_sys::fuzz_target;

const WINDOW_MS: u32 = 20;

fuzz_target!(|data: &[u8]| {
    let mut debounce = DebounceDetector::new(WINDOW_MS, false, 0);
    let mut fsm = DoorFsm::default();
    let mut now = 0u64;
    let mut last_raw = false;
    let mut last_change = 0u64;

    for &byte in data {
        let raw = byte & 0x80 != 0;
        now += u64::from(byte & 0x7F);
        if raw != last_raw {
            last_raw = raw;
            last_change = now;
        }

        if let Some(stable) = debounce.sample(raw, now) {
            assert_eq!(stable.level, raw);
            assert!(now - last_change >= u64::from(WINDOW_MS));
            let before = fsm.state();
            if let Some(edge) = fsm.transition(stable) {
                assert_eq!(edge.from, before);
                assert_ne!(edge.from, edge.to);
            }
        }
    }
});
