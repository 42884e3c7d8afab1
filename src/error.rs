//! Error types for the door monitor.
//!
//! One small `Copy` enum per failure domain so that the control loop can
//! match on exactly the failures each operation can produce.  Publish and
//! poll failures are logged and the loop keeps running; connect failures
//! feed the reconnection backoff.

use core::fmt;

// ---------------------------------------------------------------------------
// Broker session errors
// ---------------------------------------------------------------------------

/// Opening a broker session failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectError {
    /// The network link is down; the broker was never contacted.
    NetworkDown,
    /// TCP/transport level failure while reaching the broker.
    Transport,
    /// The broker answered but refused the handshake (bad credentials).
    Rejected,
    /// No CONNACK within the connect timeout.
    Timeout,
    /// Session opened but a command topic could not be subscribed.
    SubscribeFailed,
    /// A session is already open; the existing one is left untouched.
    AlreadyConnected,
    /// Identity or credentials do not fit the client's bounds.
    InvalidCredentials,
}

impl fmt::Display for ConnectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NetworkDown => write!(f, "network down"),
            Self::Transport => write!(f, "broker unreachable"),
            Self::Rejected => write!(f, "broker rejected handshake"),
            Self::Timeout => write!(f, "broker connect timed out"),
            Self::SubscribeFailed => write!(f, "subscribe failed"),
            Self::AlreadyConnected => write!(f, "already connected"),
            Self::InvalidCredentials => write!(f, "invalid identity or credentials"),
        }
    }
}

impl std::error::Error for ConnectError {}

// ---------------------------------------------------------------------------
// Publish errors
// ---------------------------------------------------------------------------

/// A single publish attempt failed.  Never retried internally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishError {
    /// No broker session is open.
    NotConnected,
    /// The client could not hand the message to the broker.
    Transport,
    /// Topic or payload exceeds the client's limits.
    PayloadTooLarge,
}

impl fmt::Display for PublishError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "not connected"),
            Self::Transport => write!(f, "transport failure"),
            Self::PayloadTooLarge => write!(f, "payload too large"),
        }
    }
}

impl std::error::Error for PublishError {}

// ---------------------------------------------------------------------------
// Inbound poll errors
// ---------------------------------------------------------------------------

/// Draining inbound messages failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollError {
    /// The transport reported that the broker session is gone.
    ConnectionLost,
    /// Any other receive-side failure; the session may still be usable.
    Transport,
}

impl fmt::Display for PollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConnectionLost => write!(f, "connection lost"),
            Self::Transport => write!(f, "receive failure"),
        }
    }
}

impl std::error::Error for PollError {}

// ---------------------------------------------------------------------------
// Sensor errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorError {
    /// GPIO read returned an error.
    GpioReadFailed,
}

impl fmt::Display for SensorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::GpioReadFailed => write!(f, "GPIO read failed"),
        }
    }
}

impl std::error::Error for SensorError {}
