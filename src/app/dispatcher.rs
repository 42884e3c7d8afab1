//! Command dispatcher: runs the effect of a recognised remote command.
//!
//! Stateless between calls.  Every effect runs to completion on the
//! control loop before the next message is looked at, so a status query
//! blocks door sampling for `status_pause_ms`; the watchdog timeout is
//! validated against that in [`SystemConfig::validate`].

use core::fmt::Write;

use log::{debug, info, warn};

use crate::config::{SystemConfig, Topic};
use crate::fsm::DoorState;
use crate::telemetry::TelemetryPublisher;
use crate::telemetry::inbound::InboundMessage;

use super::commands::{Command, CommandTopics};
use super::events::AppEvent;
use super::ports::{EventSink, IndicatorPort, PubSubClient, SystemPort, colour};

/// Liveness reply published before the state label.
pub const ALIVE_NOTICE: &str = "System alive";

pub struct CommandDispatcher {
    topics: CommandTopics,
    status_topic: Topic,
    reboot_grace_ms: u32,
    status_pause_ms: u32,
}

impl CommandDispatcher {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            topics: CommandTopics::from_config(cfg),
            status_topic: cfg.status_topic.clone(),
            reboot_grace_ms: cfg.reboot_grace_ms,
            status_pause_ms: cfg.status_pause_ms,
        }
    }

    pub fn topics(&self) -> &CommandTopics {
        &self.topics
    }

    /// Classify `msg` and run its effect.  Returns the command that ran,
    /// or `None` if the message was ignored.
    pub fn dispatch<C: PubSubClient>(
        &self,
        msg: &InboundMessage,
        telemetry: &mut TelemetryPublisher<C>,
        door: DoorState,
        hw: &mut impl IndicatorPort,
        system: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> Option<Command> {
        let Some(cmd) = self.topics.classify(&msg.topic, &msg.payload) else {
            debug!(
                "Cmd: ignored '{}' on {}",
                String::from_utf8_lossy(&msg.payload),
                msg.topic
            );
            return None;
        };

        info!("Cmd: {} requested via {}", cmd.name(), msg.topic);
        sink.emit(&AppEvent::CommandHandled(cmd));

        match cmd {
            Command::Reboot => self.reboot(telemetry, system),
            Command::StatusQuery => self.status_query(telemetry, door, hw, system),
        }
        Some(cmd)
    }

    fn reboot<C: PubSubClient>(
        &self,
        telemetry: &mut TelemetryPublisher<C>,
        system: &mut impl SystemPort,
    ) {
        let notice = reboot_notice(self.reboot_grace_ms);
        if telemetry.publish_str(&self.status_topic, &notice).is_err() {
            warn!("Cmd: reboot notice not delivered, restarting anyway");
        }
        system.delay_ms(self.reboot_grace_ms);
        info!("Cmd: restarting now");
        system.restart();
    }

    fn status_query<C: PubSubClient>(
        &self,
        telemetry: &mut TelemetryPublisher<C>,
        door: DoorState,
        hw: &mut impl IndicatorPort,
        system: &mut impl SystemPort,
    ) {
        hw.set_indicator(colour::ALIVE);
        system.delay_ms(self.status_pause_ms);
        // Each publish is independent; a failed first one does not skip the second.
        let _ = telemetry.publish_str(&self.status_topic, ALIVE_NOTICE);
        let _ = telemetry.publish_str(&self.status_topic, door.label());
        hw.set_indicator(colour::NORMAL);
    }
}

/// `"System reboot in Ns"`, N being the grace period in whole seconds,
/// rounded up.
pub fn reboot_notice(grace_ms: u32) -> heapless::String<32> {
    let mut s = heapless::String::new();
    // 20 fixed bytes plus at most 7 digits always fit.
    let _ = write!(s, "System reboot in {}s", grace_ms.div_ceil(1000));
    s
}
