//! Door monitor — the hexagonal core and the single control loop.
//!
//! [`DoorMonitor`] owns the debouncer, the door state machine, the
//! telemetry publisher and the command dispatcher.  All I/O flows through
//! port traits injected at call sites, so the whole loop runs on the host
//! against mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                 │          DoorMonitor          │
//! IndicatorPort ◀─│ Debounce · DoorFsm · Dispatch │ ──▶ TelemetryPublisher
//!                 └──────────────────────────────┘
//! ```
//!
//! One [`tick`](DoorMonitor::tick):
//! 1. drain inbound messages and run their commands;
//! 2. sample the contact, debounce, transition, publish on an edge;
//! 3. reconnect housekeeping with exponential backoff.

use core::fmt::Write;

use log::{info, warn};

use crate::config::{Label, SystemConfig};
use crate::error::{ConnectError, PollError};
use crate::fsm::{DoorFsm, DoorState, PublishEvent};
use crate::sensors::debounce::DebounceDetector;
use crate::telemetry::TelemetryPublisher;

use super::dispatcher::CommandDispatcher;
use super::events::AppEvent;
use super::ports::{
    BrokerCredentials, ConnectivityPort, EventSink, IndicatorPort, PubSubClient, SensorPort,
    SystemPort, colour,
};

/// First reconnect delay; doubles per failed attempt up to the configured cap.
pub const INITIAL_BACKOFF_SECS: u32 = 2;

// ───────────────────────────────────────────────────────────────
// Reconnect backoff
// ───────────────────────────────────────────────────────────────

/// Exponential reconnect schedule: 2 s → 4 s → 8 s … capped.
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    max_secs: u32,
    next_delay_secs: u32,
    attempts: u32,
    next_attempt_ms: Option<u64>,
}

impl ReconnectBackoff {
    pub fn new(max_secs: u32) -> Self {
        let max_secs = max_secs.max(INITIAL_BACKOFF_SECS);
        Self {
            max_secs,
            next_delay_secs: INITIAL_BACKOFF_SECS,
            attempts: 0,
            next_attempt_ms: None,
        }
    }

    /// Schedule the next attempt relative to `now_ms` and return its delay.
    pub fn arm(&mut self, now_ms: u64) -> u32 {
        let delay = self.next_delay_secs;
        self.next_attempt_ms = Some(now_ms.saturating_add(u64::from(delay) * 1000));
        self.next_delay_secs = delay.saturating_mul(2).min(self.max_secs);
        delay
    }

    pub fn is_armed(&self) -> bool {
        self.next_attempt_ms.is_some()
    }

    pub fn is_due(&self, now_ms: u64) -> bool {
        self.next_attempt_ms.is_some_and(|at| now_ms >= at)
    }

    /// Count an attempt that is about to be made.
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts = self.attempts.saturating_add(1);
        self.attempts
    }

    /// Forget the schedule after a successful connect.  Returns how many
    /// attempts it took.
    pub fn reset(&mut self) -> u32 {
        let attempts = self.attempts;
        self.attempts = 0;
        self.next_delay_secs = INITIAL_BACKOFF_SECS;
        self.next_attempt_ms = None;
        attempts
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }
}

// ───────────────────────────────────────────────────────────────
// DoorMonitor
// ───────────────────────────────────────────────────────────────

pub struct DoorMonitor<C> {
    config: SystemConfig,
    identity: Label,
    debounce: DebounceDetector,
    fsm: DoorFsm,
    telemetry: TelemetryPublisher<C>,
    dispatcher: CommandDispatcher,
    backoff: ReconnectBackoff,
    sensor_faulted: bool,
    tick_count: u64,
}

impl<C: PubSubClient> DoorMonitor<C> {
    /// Build the monitor.  The debouncer assumes a closed contact at
    /// `now_ms`; the door starts `Closed`.
    ///
    /// Does **not** touch the network: call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, client: C, identity: &str, now_ms: u64) -> Self {
        let telemetry = TelemetryPublisher::new(
            client,
            &[config.reset_topic.as_str(), config.status_command_topic.as_str()],
        );
        let mut id = Label::new();
        for ch in identity.chars() {
            if id.push(ch).is_err() {
                warn!("MQTT: client id '{}' truncated to '{}'", identity, id);
                break;
            }
        }
        Self {
            debounce: DebounceDetector::new(config.debounce_window_ms, false, now_ms),
            fsm: DoorFsm::new(DoorState::default()),
            dispatcher: CommandDispatcher::from_config(&config),
            backoff: ReconnectBackoff::new(config.reconnect_max_backoff_secs),
            telemetry,
            identity: id,
            config,
            sensor_faulted: false,
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Startup sequence: STARTING → join network → NETWORK_UP → broker
    /// session → NORMAL → connected notice.
    ///
    /// A failure leaves the monitor running offline with a reconnect
    /// already scheduled; the error is returned for the caller to log.
    pub fn start(
        &mut self,
        hw: &mut impl IndicatorPort,
        net: &mut impl ConnectivityPort,
        system: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> Result<(), ConnectError> {
        hw.set_indicator(colour::STARTING);
        sink.emit(&AppEvent::Started(self.fsm.state()));

        match self.establish(hw, net) {
            Ok(()) => {
                hw.set_indicator(colour::NORMAL);
                self.announce_connected();
                info!("Door: monitoring started in {}", self.fsm.state());
                Ok(())
            }
            Err(e) => {
                warn!("MQTT: startup connect failed ({}), continuing offline", e);
                let retry_in_secs = self.backoff.arm(system.uptime_ms());
                sink.emit(&AppEvent::TelemetryLost { retry_in_secs });
                Err(e)
            }
        }
    }

    /// One control-loop iteration.  Returns the door edge published (or
    /// attempted) during this tick, if any.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + IndicatorPort),
        net: &mut impl ConnectivityPort,
        system: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) -> Option<PublishEvent> {
        self.tick_fed(hw, net, system, sink, &mut || {})
    }

    /// [`tick`](Self::tick) that calls `feed` after every dispatched
    /// command, so a burst of blocking commands never starves the watchdog.
    pub fn tick_fed(
        &mut self,
        hw: &mut (impl SensorPort + IndicatorPort),
        net: &mut impl ConnectivityPort,
        system: &mut impl SystemPort,
        sink: &mut impl EventSink,
        feed: &mut impl FnMut(),
    ) -> Option<PublishEvent> {
        self.tick_count += 1;

        // 1. Inbound commands
        self.poll_commands(hw, system, sink, feed);

        // 2. Door sampling (fresh timestamp: a command may have blocked)
        let now = system.uptime_ms();
        let edge = self.sample_door(hw, now, sink);

        // 3. Reconnect housekeeping
        if !self.telemetry.is_connected() {
            if !self.backoff.is_armed() {
                let retry_in_secs = self.backoff.arm(now);
                warn!("MQTT: session lost, retry in {}s", retry_in_secs);
                sink.emit(&AppEvent::TelemetryLost { retry_in_secs });
            } else if self.backoff.is_due(now) {
                self.reconnect(hw, net, system, sink);
            }
        }

        edge
    }

    /// Repeat [`tick`](Self::tick) every `poll_interval_ms` until
    /// `should_stop(now_ms)` returns true, then [`shutdown`](Self::shutdown).
    ///
    /// `on_iteration` runs after every tick and after every dispatched
    /// command (watchdog feed).
    pub fn run(
        &mut self,
        hw: &mut (impl SensorPort + IndicatorPort),
        net: &mut impl ConnectivityPort,
        system: &mut impl SystemPort,
        sink: &mut impl EventSink,
        mut should_stop: impl FnMut(u64) -> bool,
        mut on_iteration: impl FnMut(),
    ) {
        info!("Door: entering main loop");
        while !should_stop(system.uptime_ms()) {
            self.tick_fed(hw, net, system, sink, &mut on_iteration);
            on_iteration();
            system.delay_ms(self.config.poll_interval_ms);
        }
        self.shutdown(hw, net, sink);
    }

    /// Orderly stop: final notice if connected, release the broker
    /// session and the network, STOPPED indicator.
    pub fn shutdown(
        &mut self,
        hw: &mut impl IndicatorPort,
        net: &mut impl ConnectivityPort,
        sink: &mut impl EventSink,
    ) {
        sink.emit(&AppEvent::Stopping);
        if self.telemetry.is_connected() {
            let notice = self.device_notice("is disconnecting");
            let _ = self.telemetry.publish_str(&self.config.status_topic, &notice);
        }
        self.telemetry.disconnect();
        net.disconnect();
        hw.set_indicator(colour::STOPPED);
        info!("Door: stopped after {} ticks", self.tick_count);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn state(&self) -> DoorState {
        self.fsm.state()
    }

    pub fn telemetry(&self) -> &TelemetryPublisher<C> {
        &self.telemetry
    }

    pub fn telemetry_mut(&mut self) -> &mut TelemetryPublisher<C> {
        &mut self.telemetry
    }

    pub fn backoff(&self) -> &ReconnectBackoff {
        &self.backoff
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn poll_commands(
        &mut self,
        hw: &mut impl IndicatorPort,
        system: &mut impl SystemPort,
        sink: &mut impl EventSink,
        feed: &mut impl FnMut(),
    ) {
        let dispatcher = &self.dispatcher;
        let door = self.fsm.state();
        let result = self.telemetry.poll_inbound(|tx, msg| {
            if dispatcher
                .dispatch(msg, tx, door, &mut *hw, &mut *system, &mut *sink)
                .is_some()
            {
                feed();
            }
        });
        match result {
            Ok(_) => {}
            Err(PollError::ConnectionLost) => {
                hw.set_indicator(colour::STARTING);
            }
            Err(PollError::Transport) => {}
        }
    }

    fn sample_door(
        &mut self,
        hw: &mut impl SensorPort,
        now: u64,
        sink: &mut impl EventSink,
    ) -> Option<PublishEvent> {
        let raw = match hw.read_contact() {
            Ok(level) => {
                if self.sensor_faulted {
                    self.sensor_faulted = false;
                    info!("Door: contact readable again");
                }
                level
            }
            Err(e) => {
                if !self.sensor_faulted {
                    self.sensor_faulted = true;
                    warn!("Door: {}; skipping samples until it recovers", e);
                }
                return None;
            }
        };

        let stable = self.debounce.sample(raw, now)?;
        let edge = self.fsm.transition(stable)?;

        info!("Door: {}", edge.label());
        sink.emit(&AppEvent::DoorChanged { from: edge.from, to: edge.to });
        // The local state stands even if delivery fails; a reconnect resyncs it.
        let _ = self.telemetry.publish_str(&self.config.status_topic, edge.label());
        Some(edge)
    }

    /// Network first (if down), then the broker session.
    fn establish(
        &mut self,
        hw: &mut impl IndicatorPort,
        net: &mut impl ConnectivityPort,
    ) -> Result<(), ConnectError> {
        if !net.is_connected() {
            net.connect().map_err(|e| {
                warn!("WiFi: {}", e);
                ConnectError::NetworkDown
            })?;
            info!("WiFi: connected");
        }
        hw.set_indicator(colour::NETWORK_UP);

        let creds = BrokerCredentials::from_config(&self.config);
        match self.telemetry.connect(&self.identity, &creds) {
            Ok(()) | Err(ConnectError::AlreadyConnected) => Ok(()),
            Err(e) => Err(e),
        }
    }

    fn reconnect(
        &mut self,
        hw: &mut impl IndicatorPort,
        net: &mut impl ConnectivityPort,
        system: &mut impl SystemPort,
        sink: &mut impl EventSink,
    ) {
        let attempt = self.backoff.record_attempt();
        info!("MQTT: reconnect attempt {}", attempt);

        match self.establish(hw, net) {
            Ok(()) => {
                let attempts = self.backoff.reset();
                hw.set_indicator(colour::NORMAL);
                sink.emit(&AppEvent::TelemetryRestored { attempts });
                self.announce_connected();
                // Resync the feed with whatever happened while offline.
                let label = self.fsm.state().label();
                let _ = self.telemetry.publish_str(&self.config.status_topic, label);
            }
            Err(e) => {
                let retry_in_secs = self.backoff.arm(system.uptime_ms());
                warn!(
                    "MQTT: reconnect attempt {} failed ({}), next in {}s",
                    attempt, e, retry_in_secs
                );
            }
        }
    }

    fn announce_connected(&mut self) {
        let notice = self.device_notice("is connected");
        let _ = self.telemetry.publish_str(&self.config.status_topic, &notice);
    }

    fn device_notice(&self, suffix: &str) -> heapless::String<64> {
        let mut s = heapless::String::new();
        // Device name is at most 32 bytes, so this always fits.
        let _ = write!(s, "{} {}", self.config.device_name, suffix);
        s
    }
}
