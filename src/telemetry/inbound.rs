//! Inbound message types and the bounded hand-off queue.
//!
//! On hardware the MQTT client runs its own FreeRTOS task and delivers
//! events through a callback.  The callback only pushes into an
//! [`InboundQueue`]; the control loop drains it from its own thread of
//! control, so no domain code ever runs re-entrantly.
//!
//! ```text
//! ┌──────────────┐  TransportEvent  ┌──────────────┐
//! │  MQTT task   │─────────────────▶│ Control loop │
//! │  (callback)  │   try_send only  │ try_receive  │
//! └──────────────┘                  └──────────────┘
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::{String, Vec};

/// Longest accepted topic, in bytes.
pub const MAX_TOPIC_LEN: usize = 64;
/// Longest accepted payload, in bytes.
pub const MAX_PAYLOAD_LEN: usize = 64;
/// Queue depth; also the most messages drained per poll.
pub const INBOUND_DEPTH: usize = 8;

/// One message received on a subscribed topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundMessage {
    pub topic: String<MAX_TOPIC_LEN>,
    pub payload: Vec<u8, MAX_PAYLOAD_LEN>,
}

impl InboundMessage {
    /// Copy a received message into bounded storage.
    /// Returns `None` if the topic or payload does not fit.
    pub fn new(topic: &str, payload: &[u8]) -> Option<Self> {
        Some(Self {
            topic: String::try_from(topic).ok()?,
            payload: Vec::from_slice(payload).ok()?,
        })
    }
}

/// Everything the transport can tell the control loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// The broker acknowledged the session.
    Connected,
    /// The session is gone (network drop, broker close, keepalive timeout).
    Disconnected,
    Message(InboundMessage),
}

/// Bounded SPSC hand-off between the MQTT task and the control loop.
///
/// Never blocks the producer: when full, the event is dropped and counted.
pub struct InboundQueue {
    channel: Channel<CriticalSectionRawMutex, TransportEvent, INBOUND_DEPTH>,
    dropped: AtomicU32,
}

impl InboundQueue {
    pub const fn new() -> Self {
        Self {
            channel: Channel::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Producer side.  Returns `false` if the event was dropped.
    pub fn push(&self, event: TransportEvent) -> bool {
        if self.channel.try_send(event).is_ok() {
            true
        } else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            false
        }
    }

    /// Consumer side.  Never blocks.
    pub fn pop(&self) -> Option<TransportEvent> {
        self.channel.try_receive().ok()
    }

    /// Events dropped since the last call.
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }

    /// Discard everything queued (stale events from a previous session).
    pub fn clear(&self) {
        while self.channel.try_receive().is_ok() {}
    }
}

impl Default for InboundQueue {
    fn default() -> Self {
        Self::new()
    }
}
