//! Gateway Error Types
//!
//! Centralized error taxonomy for the gateway client.

use std::time::Duration;

/// Errors produced while running a gateway session.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Opening the transport failed. Retried after a fixed pause.
    #[error("Failed to establish transport: {0}")]
    TransportEstablish(String),

    /// A write raced with a stream that was already closing.
    #[error("Write attempted on a closing stream")]
    StreamClosing,

    /// The live transport reported an error.
    #[error("Transport error: {0}")]
    Transport(String),

    /// No heartbeat ACK arrived within the heartbeat interval.
    #[error("Heartbeat ACK not received within {0:?}")]
    ProtocolLiveness(Duration),

    /// The gateway rejected our credentials.
    #[error("Authentication failed: token is invalid (close code {code})")]
    Authentication { code: u16 },

    /// The gateway voided the current session.
    #[error("Session invalidated by the gateway")]
    SessionInvalidated,

    #[error("Failed to decode gateway payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Failed to decompress gateway payload: {0}")]
    Decompress(#[from] std::io::Error),

    /// The outbound half of the connection is gone.
    #[error("Connection closed")]
    ConnectionClosed,
}

impl GatewayError {
    /// Whether this error ends the client for good.
    pub fn is_fatal(&self) -> bool {
        matches!(self, GatewayError::Authentication { .. })
    }
}
