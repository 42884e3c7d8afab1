//! Remote commands delivered on the command feeds.
//!
//! A command is recognised from the pair (topic, payload).  Only the
//! payload `"1"` triggers anything; dashboards send `"0"` when a momentary
//! button is released and that must be a no-op.

use crate::config::{SystemConfig, Topic};

/// Payload that activates a command.
pub const TRIGGER_PAYLOAD: &[u8] = b"1";

/// Commands the outside world can send to the monitor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Announce, wait the grace period, then soft-reset.
    Reboot,
    /// Report liveness and the current door state.
    StatusQuery,
}

impl Command {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Reboot => "reboot",
            Self::StatusQuery => "status-query",
        }
    }
}

/// The two inbound feeds a command can arrive on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandTopics {
    pub reset: Topic,
    pub status: Topic,
}

impl CommandTopics {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            reset: cfg.reset_topic.clone(),
            status: cfg.status_command_topic.clone(),
        }
    }

    /// Map an inbound message to a command.  Unknown topics and any payload
    /// other than [`TRIGGER_PAYLOAD`] yield `None`.
    pub fn classify(&self, topic: &str, payload: &[u8]) -> Option<Command> {
        if payload != TRIGGER_PAYLOAD {
            return None;
        }
        if topic == self.reset.as_str() {
            Some(Command::Reboot)
        } else if topic == self.status.as_str() {
            Some(Command::StatusQuery)
        } else {
            None
        }
    }
}
