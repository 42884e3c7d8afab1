//! Outbound application events.
//!
//! The [`DoorMonitor`](super::service::DoorMonitor) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the shipped one logs to serial.

use crate::fsm::DoorState;

use super::commands::Command;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The monitor has started (carries the initial door state).
    Started(DoorState),

    /// The debounced door state changed.
    DoorChanged { from: DoorState, to: DoorState },

    /// A remote command was accepted and is about to run.
    CommandHandled(Command),

    /// The broker session dropped; reconnection is scheduled.
    TelemetryLost { retry_in_secs: u32 },

    /// A broker session was re-established after a loss.
    TelemetryRestored { attempts: u32 },

    /// Orderly shutdown has begun.
    Stopping,
}
