//! WebSocket transport backed by `tokio-tungstenite`.
//!
//! The socket is split and each half gets its own task, mirroring the
//! reader/writer layout used on the server side of the gateway.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

use super::{Connection, Frame, Transport, TransportCommand, TransportEvent, ABNORMAL_CLOSURE};
use crate::shared::error::GatewayError;

/// Close code reported when the peer sent a close frame without a status.
const NO_STATUS_RECEIVED: u16 = 1005;

/// Opens TLS or plain WebSocket connections.
#[derive(Debug, Clone, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Transport for WebSocketTransport {
    async fn open(&self, url: &str) -> Result<Connection, GatewayError> {
        let (socket, _response) = connect_async(url).await.map_err(map_open_error)?;
        let (mut sink, mut stream) = socket.split();

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<TransportCommand>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<TransportEvent>();

        // Writer: drains queued commands, stops after a close request.
        tokio::spawn(async move {
            while let Some(command) = out_rx.recv().await {
                match command {
                    TransportCommand::Send(text) => {
                        if let Err(e) = sink.send(Message::Text(text)).await {
                            tracing::debug!(error = %e, "WebSocket send failed");
                            break;
                        }
                    }
                    TransportCommand::Close { code, reason } => {
                        let frame = CloseFrame {
                            code: CloseCode::from(code),
                            reason: reason.into(),
                        };
                        if let Err(e) = sink.send(Message::Close(Some(frame))).await {
                            tracing::debug!(error = %e, "WebSocket close failed");
                        }
                        break;
                    }
                }
            }
            let _ = sink.close().await;
        });

        // Reader: forwards frames until the socket or the consumer goes away.
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = in_tx.closed() => break,
                    msg = stream.next() => {
                        let (event, last) = match msg {
                            Some(Ok(Message::Text(text))) => {
                                (TransportEvent::Message(Frame::Text(text)), false)
                            }
                            Some(Ok(Message::Binary(bytes))) => {
                                (TransportEvent::Message(Frame::Binary(bytes)), false)
                            }
                            Some(Ok(Message::Close(frame))) => {
                                let (code, reason) = frame
                                    .map(|f| (u16::from(f.code), f.reason.into_owned()))
                                    .unwrap_or((NO_STATUS_RECEIVED, String::new()));
                                (TransportEvent::Closed { code, reason }, true)
                            }
                            // Ping/pong handled by tungstenite
                            Some(Ok(_)) => continue,
                            Some(Err(e)) => (TransportEvent::Error(e.to_string()), true),
                            None => (
                                TransportEvent::Closed {
                                    code: ABNORMAL_CLOSURE,
                                    reason: "stream ended".into(),
                                },
                                true,
                            ),
                        };
                        if in_tx.send(event).is_err() || last {
                            break;
                        }
                    }
                }
            }
        });

        Ok(Connection::new(out_tx, in_rx))
    }
}

fn map_open_error(err: WsError) -> GatewayError {
    match err {
        WsError::AlreadyClosed | WsError::ConnectionClosed => GatewayError::StreamClosing,
        other => GatewayError::TransportEstablish(other.to_string()),
    }
}
