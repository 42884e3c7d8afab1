//! MQTT client adapter.
//!
//! Implements [`PubSubClient`] on top of the ESP-IDF MQTT client.  The
//! client runs its own task and reports through a callback; the callback
//! only converts the event and pushes it into an [`InboundQueue`].
//! [`poll`](PubSubClient::poll) drains that queue on the control loop.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: `EspMqttClient::new_cb` with a static queue.
//! - **all other targets**: an in-memory broker session for host tests,
//!   with hooks to inject messages and failures.

use log::warn;

use crate::app::ports::{BrokerCredentials, PubSubClient};
use crate::error::{ConnectError, PollError, PublishError};
use crate::telemetry::inbound::{InboundMessage, InboundQueue, TransportEvent};

#[cfg(target_os = "espidf")]
use esp_idf_svc::mqtt::client::{Details, EspMqttClient, EventPayload, MqttClientConfiguration, QoS};

/// Largest outbound payload accepted.
pub const MAX_OUTBOUND_PAYLOAD: usize = 256;

/// Broker keep-alive; a silent broker is declared lost after 1.5× this.
#[cfg(target_os = "espidf")]
const KEEP_ALIVE_SECS: u64 = 30;

/// Filled by the MQTT task, drained by the control loop.
#[cfg(target_os = "espidf")]
static INBOUND: InboundQueue = InboundQueue::new();

/// Next message from `queue`, skipping connection notices.
fn next_message(queue: &InboundQueue) -> Result<Option<InboundMessage>, PollError> {
    let dropped = queue.take_dropped();
    if dropped > 0 {
        warn!("MQTT: {} inbound event(s) dropped, queue full", dropped);
    }
    while let Some(event) = queue.pop() {
        match event {
            TransportEvent::Connected => {}
            TransportEvent::Disconnected => return Err(PollError::ConnectionLost),
            TransportEvent::Message(msg) => return Ok(Some(msg)),
        }
    }
    Ok(None)
}

fn check_payload(payload: &[u8]) -> Result<(), PublishError> {
    if payload.len() > MAX_OUTBOUND_PAYLOAD {
        return Err(PublishError::PayloadTooLarge);
    }
    Ok(())
}

// ───────────────────────────────────────────────────────────────
// ESP-IDF client
// ───────────────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct MqttAdapter {
    client: Option<EspMqttClient<'static>>,
    connect_timeout_ms: u32,
}

#[cfg(target_os = "espidf")]
impl MqttAdapter {
    /// `connect_timeout_ms` bounds the wait for the broker's CONNACK.
    pub fn new(connect_timeout_ms: u32) -> Self {
        Self {
            client: None,
            connect_timeout_ms,
        }
    }

    /// Runs on the MQTT task.  Never blocks.
    fn on_event(payload: EventPayload<'_, esp_idf_svc::sys::EspError>) {
        let event = match payload {
            EventPayload::Connected(_) => TransportEvent::Connected,
            EventPayload::Disconnected => TransportEvent::Disconnected,
            EventPayload::Received {
                topic: Some(topic),
                data,
                details: Details::Complete,
                ..
            } => match InboundMessage::new(topic, data) {
                Some(msg) => TransportEvent::Message(msg),
                None => {
                    warn!("MQTT: oversized message on '{}' ({} bytes) dropped", topic, data.len());
                    return;
                }
            },
            EventPayload::Received { .. } => {
                warn!("MQTT: fragmented message dropped");
                return;
            }
            EventPayload::Error(e) => {
                warn!("MQTT: client error {:?}", e);
                return;
            }
            _ => return,
        };
        INBOUND.push(event);
    }

    fn uptime_ms() -> u64 {
        // SAFETY: read-only query of the high-resolution timer.
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64 / 1_000
    }

    /// Block until the broker accepts or refuses the session.
    fn wait_connected(&self) -> Result<(), ConnectError> {
        let deadline = Self::uptime_ms() + u64::from(self.connect_timeout_ms);
        while Self::uptime_ms() < deadline {
            match INBOUND.pop() {
                Some(TransportEvent::Connected) => return Ok(()),
                Some(TransportEvent::Disconnected) => return Err(ConnectError::Rejected),
                Some(TransportEvent::Message(_)) => {}
                None => esp_idf_hal::delay::FreeRtos::delay_ms(10),
            }
        }
        Err(ConnectError::Timeout)
    }
}

#[cfg(target_os = "espidf")]
impl PubSubClient for MqttAdapter {
    fn connect(&mut self, identity: &str, credentials: &BrokerCredentials<'_>) -> Result<(), ConnectError> {
        use core::fmt::Write;

        if self.client.is_some() {
            return Err(ConnectError::AlreadyConnected);
        }
        if credentials.host.is_empty() || credentials.port == 0 {
            return Err(ConnectError::InvalidCredentials);
        }

        let mut url = heapless::String::<96>::new();
        write!(url, "mqtt://{}:{}", credentials.host, credentials.port)
            .map_err(|_| ConnectError::InvalidCredentials)?;

        let conf = MqttClientConfiguration {
            client_id: Some(identity),
            username: (!credentials.username.is_empty()).then_some(credentials.username),
            password: (!credentials.key.is_empty()).then_some(credentials.key),
            keep_alive_interval: Some(core::time::Duration::from_secs(KEEP_ALIVE_SECS)),
            ..Default::default()
        };

        INBOUND.clear();
        let client = EspMqttClient::new_cb(&url, &conf, |event| Self::on_event(event.payload()))
            .map_err(|e| {
                warn!("MQTT: client init failed: {}", e);
                ConnectError::Transport
            })?;
        self.client = Some(client);

        if let Err(e) = self.wait_connected() {
            self.disconnect();
            return Err(e);
        }
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ConnectError> {
        let client = self.client.as_mut().ok_or(ConnectError::NetworkDown)?;
        client
            .subscribe(topic, QoS::AtLeastOnce)
            .map(|_| ())
            .map_err(|_| ConnectError::SubscribeFailed)
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        check_payload(payload)?;
        let client = self.client.as_mut().ok_or(PublishError::NotConnected)?;
        client
            .publish(topic, QoS::AtLeastOnce, false, payload)
            .map(|_| ())
            .map_err(|_| PublishError::Transport)
    }

    fn poll(&mut self) -> Result<Option<InboundMessage>, PollError> {
        if self.client.is_none() {
            return Ok(None);
        }
        next_message(&INBOUND)
    }

    fn disconnect(&mut self) {
        // Dropping the client stops its task and closes the socket.
        self.client = None;
        INBOUND.clear();
    }
}

// ───────────────────────────────────────────────────────────────
// Simulation
// ───────────────────────────────────────────────────────────────

/// In-memory broker session for host builds.
#[cfg(not(target_os = "espidf"))]
#[derive(Default)]
pub struct MqttAdapter {
    queue: InboundQueue,
    session: bool,
    refuse_connect: bool,
    fail_publishes: u32,
    subscriptions: Vec<String>,
    published: Vec<(String, Vec<u8>)>,
}

#[cfg(not(target_os = "espidf"))]
impl MqttAdapter {
    pub fn new(_connect_timeout_ms: u32) -> Self {
        Self::default()
    }

    /// Deliver a message as if the broker had sent it.  Returns `false` if
    /// it was too large or the queue was full.
    pub fn inject(&self, topic: &str, payload: &[u8]) -> bool {
        match InboundMessage::new(topic, payload) {
            Some(msg) => self.queue.push(TransportEvent::Message(msg)),
            None => false,
        }
    }

    /// Simulate the broker closing the session.
    pub fn drop_connection(&self) {
        self.queue.push(TransportEvent::Disconnected);
    }

    pub fn set_refuse_connect(&mut self, refuse: bool) {
        self.refuse_connect = refuse;
    }

    /// Fail the next `n` publishes with a transport error.
    pub fn fail_next_publishes(&mut self, n: u32) {
        self.fail_publishes = n;
    }

    pub fn subscriptions(&self) -> &[String] {
        &self.subscriptions
    }

    pub fn published(&self) -> &[(String, Vec<u8>)] {
        &self.published
    }

    pub fn has_session(&self) -> bool {
        self.session
    }
}

#[cfg(not(target_os = "espidf"))]
impl PubSubClient for MqttAdapter {
    fn connect(&mut self, _identity: &str, credentials: &BrokerCredentials<'_>) -> Result<(), ConnectError> {
        if self.session {
            return Err(ConnectError::AlreadyConnected);
        }
        if credentials.host.is_empty() || credentials.port == 0 {
            return Err(ConnectError::InvalidCredentials);
        }
        if self.refuse_connect {
            return Err(ConnectError::Rejected);
        }
        self.session = true;
        self.subscriptions.clear();
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ConnectError> {
        if !self.session {
            return Err(ConnectError::NetworkDown);
        }
        self.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        check_payload(payload)?;
        if !self.session {
            return Err(PublishError::NotConnected);
        }
        if self.fail_publishes > 0 {
            self.fail_publishes -= 1;
            return Err(PublishError::Transport);
        }
        self.published.push((topic.to_owned(), payload.to_vec()));
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<InboundMessage>, PollError> {
        if !self.session {
            return Ok(None);
        }
        let result = next_message(&self.queue);
        if result.is_err() {
            self.session = false;
        }
        result
    }

    fn disconnect(&mut self) {
        self.session = false;
        self.queue.clear();
    }
}
