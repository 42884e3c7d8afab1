//! Dwell-time debouncer for a single digital input.
//!
//! The contact is sampled once per loop iteration.  A level is reported as
//! stable only after it has stayed unchanged for at least the configured
//! window, and each stable run is reported exactly once:
//!
//! ```text
//!   raw    ‾‾|_|‾|______________|‾‾‾‾‾‾‾‾‾‾‾‾‾‾
//!              ^ last change    ^ change
//!              |<-- window -->| emit(false)   ...  emit(true)
//! ```
//!
//! Pure function of its input history: no I/O, no clock access.

/// A raw level that has persisted for at least the debounce window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StableSample {
    /// `true` = input asserted (high).
    pub level: bool,
    /// Time of the sample that completed the dwell (ms since boot).
    pub at_ms: u64,
}

#[derive(Debug, Clone)]
pub struct DebounceDetector {
    window_ms: u64,
    last_seen_raw: bool,
    last_change_ms: u64,
    last_emitted: Option<bool>,
}

impl DebounceDetector {
    /// `initial_raw` is the level assumed before the first sample and
    /// `now_ms` the instant it was assumed; a zero window is raised to 1 ms.
    pub fn new(window_ms: u32, initial_raw: bool, now_ms: u64) -> Self {
        Self {
            window_ms: u64::from(window_ms.max(1)),
            last_seen_raw: initial_raw,
            last_change_ms: now_ms,
            last_emitted: None,
        }
    }

    /// Feed one raw reading taken at `now_ms`.
    pub fn sample(&mut self, raw: bool, now_ms: u64) -> Option<StableSample> {
        if raw != self.last_seen_raw {
            self.last_seen_raw = raw;
            self.last_change_ms = now_ms;
            return None;
        }

        if now_ms.saturating_sub(self.last_change_ms) < self.window_ms {
            return None;
        }
        if self.last_emitted == Some(raw) {
            return None;
        }

        self.last_emitted = Some(raw);
        Some(StableSample {
            level: raw,
            at_ms: now_ms,
        })
    }
}
