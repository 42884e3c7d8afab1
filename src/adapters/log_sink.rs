//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (UART / USB-CDC in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink {
    emitted: u32,
}

impl LogEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Events written since construction.
    pub fn emitted(&self) -> u32 {
        self.emitted
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        self.emitted = self.emitted.wrapping_add(1);
        match event {
            AppEvent::Started(state) => {
                info!("START | door={}", state);
            }
            AppEvent::DoorChanged { from, to } => {
                info!("DOOR  | {} -> {}", from, to);
            }
            AppEvent::CommandHandled(cmd) => {
                info!("CMD   | {}", cmd.name());
            }
            AppEvent::TelemetryLost { retry_in_secs } => {
                warn!("LINK  | lost, retry in {}s", retry_in_secs);
            }
            AppEvent::TelemetryRestored { attempts } => {
                info!("LINK  | restored after {} attempt(s)", attempts);
            }
            AppEvent::Stopping => {
                info!("STOP  | shutting down");
            }
        }
    }
}
