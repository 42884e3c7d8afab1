//! Telemetry publisher — the resilient wrapper around the MQTT client.
//!
//! Owns the [`ConnectionState`] and the command-topic subscriptions.  Every
//! publish is a single attempt whose real outcome is logged and returned;
//! reconnection is the caller's decision (see
//! [`DoorMonitor`](crate::app::service::DoorMonitor)).
//!
//! ```text
//!   DoorMonitor ──publish──▶ TelemetryPublisher ──▶ PubSubClient ──▶ broker
//!        ▲                          │
//!        └──── handler(msg) ◀── poll_inbound ◀──── queued messages
//! ```

pub mod inbound;

use heapless::Vec;
use log::{info, warn};

use crate::app::ports::{BrokerCredentials, PubSubClient};
use crate::config::Topic;
use crate::error::{ConnectError, PollError, PublishError};
use inbound::{INBOUND_DEPTH, InboundMessage};

/// Most command topics a publisher re-subscribes on connect.
const MAX_SUBSCRIPTIONS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

pub struct TelemetryPublisher<C> {
    client: C,
    state: ConnectionState,
    subscriptions: Vec<Topic, MAX_SUBSCRIPTIONS>,
    published: u32,
    failed: u32,
}

impl<C: PubSubClient> TelemetryPublisher<C> {
    /// Wrap `client`; `subscriptions` are (re)subscribed on every connect.
    /// Topics beyond the fixed capacity are ignored with a warning.
    pub fn new(client: C, subscriptions: &[&str]) -> Self {
        let mut subs: Vec<Topic, MAX_SUBSCRIPTIONS> = Vec::new();
        for topic in subscriptions {
            match Topic::try_from(*topic).map(|t| subs.push(t)) {
                Ok(Ok(())) => {}
                _ => warn!("MQTT: subscription '{}' dropped (capacity or length)", topic),
            }
        }
        Self {
            client,
            state: ConnectionState::Disconnected,
            subscriptions: subs,
            published: 0,
            failed: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// Publish attempts accepted by the client since boot.
    pub fn published_count(&self) -> u32 {
        self.published
    }

    /// Publish attempts that failed since boot.
    pub fn failed_count(&self) -> u32 {
        self.failed
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }

    // ── Session ───────────────────────────────────────────────

    /// Open a broker session and subscribe to the command topics.
    ///
    /// Only valid while disconnected; an open session is left untouched and
    /// [`ConnectError::AlreadyConnected`] is returned.
    pub fn connect(
        &mut self,
        identity: &str,
        credentials: &BrokerCredentials<'_>,
    ) -> Result<(), ConnectError> {
        if self.is_connected() {
            return Err(ConnectError::AlreadyConnected);
        }

        info!(
            "MQTT: connecting to {}:{} as '{}'",
            credentials.host, credentials.port, identity
        );
        if let Err(e) = self.client.connect(identity, credentials) {
            warn!("MQTT: connect failed: {}", e);
            return Err(e);
        }

        for topic in &self.subscriptions {
            if let Err(e) = self.client.subscribe(topic) {
                warn!("MQTT: subscribe to '{}' failed: {}", topic, e);
                self.client.disconnect();
                return Err(ConnectError::SubscribeFailed);
            }
            info!("MQTT: subscribed to '{}'", topic);
        }

        self.state = ConnectionState::Connected;
        info!("MQTT: connected. Client ID: {}", identity);
        Ok(())
    }

    /// Release the session.  No-op when already disconnected.
    pub fn disconnect(&mut self) {
        if !self.is_connected() {
            return;
        }
        self.client.disconnect();
        self.state = ConnectionState::Disconnected;
        info!("MQTT: disconnected");
    }

    // ── Outbound ──────────────────────────────────────────────

    /// One delivery attempt.  The outcome is logged either way; a transport
    /// failure does not change [`ConnectionState`].
    pub fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let text = String::from_utf8_lossy(payload);

        if !self.is_connected() {
            self.failed = self.failed.saturating_add(1);
            warn!("MQTT: publish '{}' -> {} FAILED (not connected)", text, topic);
            return Err(PublishError::NotConnected);
        }

        match self.client.publish(topic, payload) {
            Ok(()) => {
                self.published = self.published.saturating_add(1);
                info!("MQTT: publish '{}' -> {} OK", text, topic);
                Ok(())
            }
            Err(e) => {
                self.failed = self.failed.saturating_add(1);
                warn!("MQTT: publish '{}' -> {} FAILED ({})", text, topic, e);
                Err(e)
            }
        }
    }

    pub fn publish_str(&mut self, topic: &str, payload: &str) -> Result<(), PublishError> {
        self.publish(topic, payload.as_bytes())
    }

    // ── Inbound ───────────────────────────────────────────────

    /// Drain the messages queued right now (at most [`INBOUND_DEPTH`]),
    /// calling `handler` for each on the caller's thread.
    ///
    /// The handler receives the publisher back so command effects can
    /// publish.  A lost connection flips the state to `Disconnected`.
    pub fn poll_inbound(
        &mut self,
        mut handler: impl FnMut(&mut Self, &InboundMessage),
    ) -> Result<usize, PollError> {
        if !self.is_connected() {
            return Ok(0);
        }

        let mut handled = 0;
        while handled < INBOUND_DEPTH {
            match self.client.poll() {
                Ok(Some(msg)) => {
                    handled += 1;
                    handler(self, &msg);
                }
                Ok(None) => break,
                Err(PollError::ConnectionLost) => {
                    warn!("MQTT: connection lost while polling");
                    self.state = ConnectionState::Disconnected;
                    self.client.disconnect();
                    return Err(PollError::ConnectionLost);
                }
                Err(e) => {
                    warn!("MQTT: poll failed: {}", e);
                    return Err(e);
                }
            }
            // A handler may have torn the session down.
            if !self.is_connected() {
                break;
            }
        }
        Ok(handled)
    }
}
