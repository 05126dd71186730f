//! Transport Adapter
//!
//! The gateway core never touches a socket directly. A [`Transport`] opens
//! a [`Connection`], which is a pair of channels: commands flow out,
//! notifications flow in. Anything that can move text frames can back it.

mod websocket;

pub use websocket::WebSocketTransport;

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::shared::error::GatewayError;

/// Close code reported when the inbound side disappears without a close frame.
pub const ABNORMAL_CLOSURE: u16 = 1006;

/// One inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    Text(String),
    /// Binary frames carry zlib-compressed JSON.
    Binary(Vec<u8>),
}

/// Notifications delivered by a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Message(Frame),
    Closed { code: u16, reason: String },
    Error(String),
}

/// Requests sent to a live connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    Send(String),
    Close { code: u16, reason: String },
}

/// Opens connections to a gateway URL.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn open(&self, url: &str) -> Result<Connection, GatewayError>;
}

/// A live connection handle.
#[derive(Debug)]
pub struct Connection {
    outbound: mpsc::UnboundedSender<TransportCommand>,
    inbound: mpsc::UnboundedReceiver<TransportEvent>,
}

impl Connection {
    pub fn new(
        outbound: mpsc::UnboundedSender<TransportCommand>,
        inbound: mpsc::UnboundedReceiver<TransportEvent>,
    ) -> Self {
        Self { outbound, inbound }
    }

    /// Queue a text frame.
    pub fn send(&self, text: String) -> Result<(), GatewayError> {
        self.outbound
            .send(TransportCommand::Send(text))
            .map_err(|_| GatewayError::ConnectionClosed)
    }

    /// Ask the transport to close. Closing twice is harmless.
    pub fn close(&self, code: u16, reason: impl Into<String>) {
        let _ = self.outbound.send(TransportCommand::Close {
            code,
            reason: reason.into(),
        });
    }

    /// Next notification; a vanished transport reads as an abnormal close.
    pub async fn next_event(&mut self) -> TransportEvent {
        match self.inbound.recv().await {
            Some(event) => event,
            None => TransportEvent::Closed {
                code: ABNORMAL_CLOSURE,
                reason: "connection dropped".into(),
            },
        }
    }
}
