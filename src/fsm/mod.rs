//! Door state machine.
//!
//! Holds the last published [`DoorState`] and turns debounced samples into
//! publish events on edges only:
//!
//! ```text
//!                 sample(asserted)
//!   ┌────────┐ ─────────────────────▶ ┌────────┐
//!   │ Closed │                        │  Open  │
//!   └────────┘ ◀───────────────────── └────────┘
//!                 sample(released)
//! ```
//!
//! A sample that maps to the state already held produces nothing.  That
//! equality check is the only de-duplication in the publish path.

use crate::sensors::debounce::StableSample;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

/// Debounced position of the door.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum DoorState {
    Open,
    #[default]
    Closed,
}

impl DoorState {
    /// Polarity rule: an asserted (high) contact means the door is open.
    pub const fn from_level(asserted: bool) -> Self {
        if asserted { Self::Open } else { Self::Closed }
    }

    /// Canonical label published on the status feed.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closed => "CLOSED",
        }
    }
}

impl core::fmt::Display for DoorState {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// An edge that must be reported on the status feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublishEvent {
    pub from: DoorState,
    pub to: DoorState,
}

impl PublishEvent {
    /// Payload to publish: the new state's canonical label.
    pub const fn label(&self) -> &'static str {
        self.to.label()
    }
}

// ---------------------------------------------------------------------------
// DoorFsm
// ---------------------------------------------------------------------------

/// Owner of the single [`DoorState`] instance.
#[derive(Debug, Default)]
pub struct DoorFsm {
    state: DoorState,
}

impl DoorFsm {
    /// Start in `initial` (the process default is [`DoorState::Closed`]).
    pub fn new(initial: DoorState) -> Self {
        Self { state: initial }
    }

    pub fn state(&self) -> DoorState {
        self.state
    }

    /// Feed a debounced sample.  Returns an event only when the mapped
    /// state differs from the held one; the held state is updated first.
    pub fn transition(&mut self, sample: StableSample) -> Option<PublishEvent> {
        let next = DoorState::from_level(sample.level);
        if next == self.state {
            return None;
        }
        let from = self.state;
        self.state = next;
        Some(PublishEvent { from, to: next })
    }
}
