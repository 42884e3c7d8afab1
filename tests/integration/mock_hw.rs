//! Mock adapters for integration tests.
//!
//! Records every port call so tests can assert on the full history
//! without touching real GPIO, PWM, WiFi or a broker.  Mocks that need a
//! cross-adapter ordering (publish before restart) share a [`Journal`].

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use doorwatch::app::events::AppEvent;
use doorwatch::app::ports::{
    BrokerCredentials, ConnectivityError, ConnectivityPort, EventSink, IndicatorPort, PubSubClient,
    SensorPort, SystemPort,
};
use doorwatch::app::service::DoorMonitor;
use doorwatch::config::SystemConfig;
use doorwatch::error::{ConnectError, PollError, PublishError, SensorError};
use doorwatch::fsm::PublishEvent;
use doorwatch::telemetry::inbound::InboundMessage;

/// Ordered log of side effects shared between mocks.
pub type Journal = Rc<RefCell<Vec<String>>>;

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    /// Level returned by the next contact read (`true` = open).
    pub level: bool,
    pub read_fails: bool,
    pub colours: Vec<u32>,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_colour(&self) -> Option<u32> {
        self.colours.last().copied()
    }
}

impl SensorPort for MockHardware {
    fn read_contact(&mut self) -> Result<bool, SensorError> {
        if self.read_fails {
            Err(SensorError::GpioReadFailed)
        } else {
            Ok(self.level)
        }
    }
}

impl IndicatorPort for MockHardware {
    fn set_indicator(&mut self, colour: u32) {
        self.colours.push(colour);
    }
}

// ── MockClock ─────────────────────────────────────────────────

/// Manual clock: time only moves through `advance` and `delay_ms`.
#[derive(Default)]
pub struct MockClock {
    pub now_ms: u64,
    pub delays: Vec<u32>,
    pub restarts: u32,
    pub journal: Journal,
}

#[allow(dead_code)]
impl MockClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }
}

impl SystemPort for MockClock {
    fn uptime_ms(&self) -> u64 {
        self.now_ms
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delays.push(ms);
        self.now_ms += u64::from(ms);
        self.journal.borrow_mut().push(format!("delay:{ms}"));
    }

    fn restart(&mut self) {
        self.restarts += 1;
        self.journal.borrow_mut().push("restart".to_owned());
    }
}

// ── MockNet ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNet {
    pub up: bool,
    /// Fail this many upcoming joins.
    pub fail_connects: u32,
    pub connects: u32,
    pub disconnects: u32,
}

#[allow(dead_code)]
impl MockNet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConnectivityPort for MockNet {
    fn connect(&mut self) -> Result<(), ConnectivityError> {
        self.connects += 1;
        if self.up {
            return Err(ConnectivityError::AlreadyConnected);
        }
        if self.fail_connects > 0 {
            self.fail_connects -= 1;
            return Err(ConnectivityError::ConnectionFailed);
        }
        self.up = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.up = false;
    }

    fn is_connected(&self) -> bool {
        self.up
    }
}

// ── MockClient ────────────────────────────────────────────────

#[derive(Default)]
pub struct MockClient {
    pub session: bool,
    /// Refuse this many upcoming broker handshakes.
    pub refuse_connects: u32,
    /// Fail this many upcoming publishes with a transport error.
    pub fail_publishes: u32,
    /// Next poll reports the session as lost.
    pub lose_connection: bool,
    pub connects: u32,
    pub identities: Vec<String>,
    pub subscriptions: Vec<String>,
    pub published: Vec<(String, String)>,
    pub inbox: VecDeque<InboundMessage>,
    pub journal: Journal,
}

#[allow(dead_code)]
impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, topic: &str, payload: &[u8]) {
        self.inbox
            .push_back(InboundMessage::new(topic, payload).expect("test message fits"));
    }

    /// Payloads published on `topic`, in order.
    pub fn payloads(&self, topic: &str) -> Vec<&str> {
        self.published
            .iter()
            .filter(|(t, _)| t == topic)
            .map(|(_, p)| p.as_str())
            .collect()
    }
}

impl PubSubClient for MockClient {
    fn connect(&mut self, identity: &str, _credentials: &BrokerCredentials<'_>) -> Result<(), ConnectError> {
        self.connects += 1;
        if self.session {
            return Err(ConnectError::AlreadyConnected);
        }
        if self.refuse_connects > 0 {
            self.refuse_connects -= 1;
            return Err(ConnectError::Rejected);
        }
        self.identities.push(identity.to_owned());
        self.session = true;
        Ok(())
    }

    fn subscribe(&mut self, topic: &str) -> Result<(), ConnectError> {
        self.subscriptions.push(topic.to_owned());
        Ok(())
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if self.fail_publishes > 0 {
            self.fail_publishes -= 1;
            return Err(PublishError::Transport);
        }
        let text = String::from_utf8_lossy(payload).into_owned();
        self.journal.borrow_mut().push(format!("publish:{text}"));
        self.published.push((topic.to_owned(), text));
        Ok(())
    }

    fn poll(&mut self) -> Result<Option<InboundMessage>, PollError> {
        if self.lose_connection {
            self.lose_connection = false;
            self.session = false;
            return Err(PollError::ConnectionLost);
        }
        Ok(self.inbox.pop_front())
    }

    fn disconnect(&mut self) {
        self.session = false;
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Rig ───────────────────────────────────────────────────────

/// A monitor wired to fresh mocks, network up, not yet started.
pub struct Rig {
    pub monitor: DoorMonitor<MockClient>,
    pub hw: MockHardware,
    pub net: MockNet,
    pub clock: MockClock,
    pub sink: RecordingSink,
    pub journal: Journal,
}

#[allow(dead_code)]
impl Rig {
    pub fn new(config: SystemConfig) -> Self {
        let journal = Journal::default();
        let client = MockClient {
            journal: journal.clone(),
            ..MockClient::default()
        };
        let clock = MockClock {
            journal: journal.clone(),
            ..MockClock::default()
        };
        Self {
            monitor: DoorMonitor::new(config, client, "deadbeefcafe", 0),
            hw: MockHardware::new(),
            net: MockNet {
                up: true,
                ..MockNet::default()
            },
            clock,
            sink: RecordingSink::new(),
            journal,
        }
    }

    /// Default config, started and connected, journal cleared.
    pub fn started() -> Self {
        let mut rig = Self::new(SystemConfig::default());
        rig.start().expect("mock start succeeds");
        rig.journal.borrow_mut().clear();
        rig
    }

    pub fn start(&mut self) -> Result<(), ConnectError> {
        self.monitor
            .start(&mut self.hw, &mut self.net, &mut self.clock, &mut self.sink)
    }

    pub fn tick(&mut self) -> Option<PublishEvent> {
        self.monitor
            .tick(&mut self.hw, &mut self.net, &mut self.clock, &mut self.sink)
    }

    /// Advance the clock by `step_ms`, then tick.
    pub fn step(&mut self, step_ms: u64) -> Option<PublishEvent> {
        self.clock.advance(step_ms);
        self.tick()
    }

    pub fn client(&self) -> &MockClient {
        self.monitor.telemetry().client()
    }

    pub fn client_mut(&mut self) -> &mut MockClient {
        self.monitor.telemetry_mut().client_mut()
    }

    /// Payloads published on the configured status feed.
    pub fn status_feed(&self) -> Vec<String> {
        let topic = self.monitor.config().status_topic.clone();
        self.client()
            .payloads(&topic)
            .into_iter()
            .map(str::to_owned)
            .collect()
    }

    pub fn journal(&self) -> Vec<String> {
        self.journal.borrow().clone()
    }
}
