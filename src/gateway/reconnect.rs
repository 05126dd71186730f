//! Reconnect policy
//!
//! Decides what happens after a connection ends. Only an invalid token
//! stops the client for good; a local shutdown stops it quietly; anything
//! else reconnects straight away and tries to resume.

use crate::shared::error::GatewayError;

pub const NORMAL_CLOSURE: u16 = 1000;
/// Sent by the client when heartbeat acknowledgements stop arriving.
pub const HEARTBEAT_TIMEOUT_CLOSURE: u16 = 1001;
/// Sent by the client when the gateway asks for a reconnect (op 7).
pub const RECONNECT_REQUESTED_CLOSURE: u16 = 4000;
/// Gateway close code for a rejected token.
pub const AUTHENTICATION_FAILED: u16 = 4004;

/// Why a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisconnectCause {
    /// The server closed the socket, or the socket dropped.
    Remote,
    TransportError,
    HeartbeatTimeout,
    ReconnectRequested,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Disconnect {
    pub code: u16,
    pub reason: String,
    pub cause: DisconnectCause,
}

impl Disconnect {
    pub fn new(code: u16, reason: impl Into<String>, cause: DisconnectCause) -> Self {
        Self {
            code,
            reason: reason.into(),
            cause,
        }
    }
}

#[derive(Debug)]
pub enum ReconnectDecision {
    /// Stop without error. The client was asked to shut down.
    Stop,
    /// Stop and report the error.
    Fatal(GatewayError),
    /// Open a new connection, resuming if possible.
    Reconnect,
}

pub fn decide(disconnect: &Disconnect, shutdown_requested: bool) -> ReconnectDecision {
    if shutdown_requested || disconnect.cause == DisconnectCause::Shutdown {
        return ReconnectDecision::Stop;
    }
    if disconnect.code == AUTHENTICATION_FAILED {
        return ReconnectDecision::Fatal(GatewayError::Authentication {
            code: disconnect.code,
        });
    }
    ReconnectDecision::Reconnect
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptKind {
    Fresh,
    Reconnect,
}

/// Bookkeeping for consecutive connection attempts.
#[derive(Debug, Clone)]
pub struct ConnectionAttempt {
    kind: AttemptKind,
    reconnect_count: u64,
}

impl ConnectionAttempt {
    pub fn new() -> Self {
        Self {
            kind: AttemptKind::Fresh,
            reconnect_count: 0,
        }
    }

    pub fn kind(&self) -> AttemptKind {
        self.kind
    }

    pub fn is_reconnect(&self) -> bool {
        self.kind == AttemptKind::Reconnect
    }

    pub fn reconnect_count(&self) -> u64 {
        self.reconnect_count
    }

    /// Mark the next connection as a reconnect. Returns the new count.
    pub fn record_reconnect(&mut self) -> u64 {
        self.kind = AttemptKind::Reconnect;
        self.reconnect_count += 1;
        self.reconnect_count
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

impl Default for ConnectionAttempt {
    fn default() -> Self {
        Self::new()
    }
}
