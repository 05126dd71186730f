//! Gateway Client
//!
//! Owns one logical session across any number of physical connections.
//! All protocol state lives in this task: socket notifications, heartbeat
//! timers and shutdown requests are multiplexed through one `select!` loop,
//! so handlers run one at a time with exclusive access to the session.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn, Instrument};
use uuid::Uuid;

use super::dispatch::{DispatchEvent, DispatchRouter, RouteOutcome};
use super::events::{ClientEvent, EventRegistry};
use super::heartbeat::{HeartbeatController, HeartbeatSignal};
use super::messages::{
    self, Envelope, GatewaySend, HelloPayload, IdentifyPayload, IdentifyProperties, OpCode,
    ResumePayload,
};
use super::reconnect::{
    self, ConnectionAttempt, Disconnect, DisconnectCause, ReconnectDecision,
    HEARTBEAT_TIMEOUT_CLOSURE, NORMAL_CLOSURE, RECONNECT_REQUESTED_CLOSURE,
};
use crate::domain::entities::Session;
use crate::infrastructure::metrics;
use crate::infrastructure::transport::{Connection, Frame, Transport, TransportEvent};
use crate::shared::error::GatewayError;

/// Pause between failed connection attempts.
pub const DEFAULT_CONNECT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Identifies this client to the gateway and REST API.
pub const USER_AGENT: &str = concat!(
    "gateway-client (",
    env!("CARGO_PKG_REPOSITORY"),
    ", ",
    env!("CARGO_PKG_VERSION"),
    ")"
);

/// Connection parameters for one client.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    /// Full gateway URL including version and encoding query.
    pub url: String,
    pub token: String,
    /// Ask the gateway to zlib-compress large payloads.
    pub compress: bool,
    pub intents: Option<u64>,
    pub connect_retry_delay: Duration,
    pub properties: IdentifyProperties,
}

impl GatewayConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: token.into(),
            compress: true,
            intents: None,
            connect_retry_delay: DEFAULT_CONNECT_RETRY_DELAY,
            properties: default_properties(),
        }
    }

    /// Append the protocol version and JSON encoding to a base gateway URL.
    pub fn gateway_url(base: &str, version: u8) -> String {
        let separator = if base.contains('?') { '&' } else { '?' };
        format!("{base}{separator}v={version}&encoding=json")
    }
}

pub fn default_properties() -> IdentifyProperties {
    IdentifyProperties {
        os: std::env::consts::OS.to_owned(),
        browser: USER_AGENT.to_owned(),
        device: USER_AGENT.to_owned(),
        referrer: String::new(),
        referring_domain: String::new(),
    }
}

/// How a closed client got there.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    /// Terminal: invalid token or local shutdown.
    Fatal,
    /// Between connections; a new attempt follows immediately.
    Recoverable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Idle,
    Connecting,
    Authenticating,
    Ready,
    Closed(Closure),
}

impl ConnectionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Idle => "idle",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Authenticating => "authenticating",
            ConnectionState::Ready => "ready",
            ConnectionState::Closed(_) => "closed",
        }
    }
}

/// Requests a graceful stop from any task. Calling it more than once is
/// harmless.
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.tx.borrow()
    }
}

pub struct GatewayClient<T: Transport> {
    transport: T,
    config: GatewayConfig,
    session: Session,
    heartbeat: HeartbeatController,
    attempt: ConnectionAttempt,
    state: ConnectionState,
    events: Arc<EventRegistry>,
    router: DispatchRouter,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl<T: Transport> GatewayClient<T> {
    pub fn new(config: GatewayConfig, transport: T) -> Self {
        let events = Arc::new(EventRegistry::new());
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            transport,
            config,
            session: Session::new(),
            heartbeat: HeartbeatController::new(),
            attempt: ConnectionAttempt::new(),
            state: ConnectionState::Idle,
            router: DispatchRouter::new(events.clone()),
            events,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        }
    }

    /// Registry for listeners; shared with the running client.
    pub fn events(&self) -> Arc<EventRegistry> {
        self.events.clone()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn reconnect_count(&self) -> u64 {
        self.attempt.reconnect_count()
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Connect and keep the session alive until shutdown or a fatal error.
    ///
    /// Returns `Ok(())` after a requested shutdown and the fatal error
    /// otherwise. Recoverable disconnects never surface here.
    pub async fn run(&mut self) -> Result<(), GatewayError> {
        loop {
            if self.shutdown_requested() {
                self.finish_shutdown();
                return Ok(());
            }

            let Some(mut conn) = self.establish().await else {
                self.finish_shutdown();
                return Ok(());
            };

            let connection_id = Uuid::new_v4();
            let span = tracing::info_span!("gateway_connection", %connection_id);
            let disconnect = self.drive(&mut conn).instrument(span).await;

            self.heartbeat.disarm();
            drop(conn);
            self.events.emit(ClientEvent::Disconnected {
                code: disconnect.code,
                reason: disconnect.reason.clone(),
            });

            match reconnect::decide(&disconnect, self.shutdown_requested()) {
                ReconnectDecision::Stop => {
                    self.finish_shutdown();
                    return Ok(());
                }
                ReconnectDecision::Fatal(err) => {
                    error!(error = %err, code = disconnect.code, "Gateway closed the session permanently");
                    self.set_state(ConnectionState::Closed(Closure::Fatal));
                    self.events.emit(ClientEvent::Error {
                        fatal: true,
                        message: err.to_string(),
                    });
                    return Err(err);
                }
                ReconnectDecision::Reconnect => {
                    let attempt = self.attempt.record_reconnect();
                    metrics::record_reconnect();
                    info!(
                        code = disconnect.code,
                        reason = %disconnect.reason,
                        cause = ?disconnect.cause,
                        attempt,
                        "Reconnecting to gateway"
                    );
                    self.set_state(ConnectionState::Closed(Closure::Recoverable));
                    self.events.emit(ClientEvent::Reconnecting { attempt });
                }
            }
        }
    }

    /// Open a connection, retrying after a fixed pause. `None` means a
    /// shutdown arrived first.
    async fn establish(&mut self) -> Option<Connection> {
        loop {
            self.set_state(ConnectionState::Connecting);
            info!(
                url = %self.config.url,
                reconnect = self.attempt.is_reconnect(),
                "Connecting to gateway"
            );

            let result = tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown_rx) => return None,
                result = self.transport.open(&self.config.url) => result,
            };

            match result {
                Ok(conn) => {
                    info!("Gateway connection established");
                    self.set_state(ConnectionState::Authenticating);
                    return Some(conn);
                }
                Err(GatewayError::StreamClosing) => {
                    debug!("Connection attempt raced with a closing stream");
                }
                Err(e) => {
                    error!(error = %e, "Gateway connection failed");
                    self.events.emit(ClientEvent::Error {
                        fatal: false,
                        message: e.to_string(),
                    });
                }
            }

            let delay = self.config.connect_retry_delay;
            debug!(delay_ms = millis(delay), "Waiting before next connection attempt");
            tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown_rx) => return None,
                _ = tokio::time::sleep(delay) => {}
            }
        }
    }

    /// Run one connection until it ends.
    async fn drive(&mut self, conn: &mut Connection) -> Disconnect {
        loop {
            tokio::select! {
                _ = wait_for_shutdown(&mut self.shutdown_rx) => {
                    info!("Shutdown requested, closing gateway connection");
                    conn.close(NORMAL_CLOSURE, "client shutdown");
                    return Disconnect::new(NORMAL_CLOSURE, "client shutdown", DisconnectCause::Shutdown);
                }
                event = conn.next_event() => match event {
                    TransportEvent::Message(frame) => {
                        if let Some(disconnect) = self.handle_frame(conn, &frame) {
                            return disconnect;
                        }
                    }
                    TransportEvent::Closed { code, reason } => {
                        warn!(code, reason = %reason, "Gateway connection closed");
                        return Disconnect::new(code, reason, DisconnectCause::Remote);
                    }
                    TransportEvent::Error(message) => {
                        let err = GatewayError::Transport(message);
                        error!(error = %err, "Gateway transport failed");
                        self.events.emit(ClientEvent::Error {
                            fatal: false,
                            message: err.to_string(),
                        });
                        return Disconnect::new(
                            crate::infrastructure::transport::ABNORMAL_CLOSURE,
                            err.to_string(),
                            DisconnectCause::TransportError,
                        );
                    }
                },
                signal = self.heartbeat.wait() => match signal {
                    HeartbeatSignal::Beat => self.send_heartbeat(conn),
                    HeartbeatSignal::AckOverdue => {
                        let err = GatewayError::ProtocolLiveness(
                            self.heartbeat.interval().unwrap_or_default(),
                        );
                        warn!(error = %err, "Closing unresponsive gateway connection");
                        conn.close(HEARTBEAT_TIMEOUT_CLOSURE, "did not receive heartbeat ack");
                        return Disconnect::new(
                            HEARTBEAT_TIMEOUT_CLOSURE,
                            "did not receive heartbeat ack",
                            DisconnectCause::HeartbeatTimeout,
                        );
                    }
                },
            }
        }
    }

    fn handle_frame(&mut self, conn: &Connection, frame: &Frame) -> Option<Disconnect> {
        let Envelope {
            op,
            sequence,
            event,
            data,
        } = match messages::decode(frame) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "Dropping undecodable gateway frame");
                return None;
            }
        };
        let data = Arc::new(data);

        self.events.emit(ClientEvent::Raw {
            op,
            sequence,
            event: event.as_ref().map(|event| event.name().to_owned()),
            data: data.clone(),
        });

        if let Some(sequence) = sequence {
            self.session.observe_sequence(sequence);
        }

        match op {
            OpCode::Dispatch => self.handle_dispatch(event, sequence, data),
            OpCode::Heartbeat => {
                debug!("Gateway requested an immediate heartbeat");
                self.send_heartbeat(conn);
            }
            OpCode::Hello => self.handle_hello(conn, &data),
            OpCode::HeartbeatAck => self.handle_heartbeat_ack(),
            OpCode::InvalidSession => self.handle_invalid_session(conn, &data),
            OpCode::Reconnect => {
                info!("Gateway requested a reconnect");
                conn.close(RECONNECT_REQUESTED_CLOSURE, "reconnect requested");
                return Some(Disconnect::new(
                    RECONNECT_REQUESTED_CLOSURE,
                    "reconnect requested",
                    DisconnectCause::ReconnectRequested,
                ));
            }
            OpCode::Identify | OpCode::PresenceUpdate | OpCode::Resume => {
                debug!(op = ?op, "Ignoring client-only opcode from gateway");
            }
        }

        None
    }

    fn handle_hello(&mut self, conn: &Connection, data: &Value) {
        let hello = match HelloPayload::deserialize(data) {
            Ok(hello) => hello,
            Err(e) => {
                warn!(error = %e, "Malformed hello payload");
                return;
            }
        };

        let interval = Duration::from_millis(hello.heartbeat_interval);
        info!(heartbeat_interval_ms = hello.heartbeat_interval, "Received hello");

        if self.state == ConnectionState::Authenticating {
            self.authenticate(conn);
        } else {
            debug!(state = self.state.as_str(), "Hello outside the handshake, keeping the session");
        }
        self.heartbeat.arm(interval);
        self.send_heartbeat(conn);
    }

    /// Resume when reconnecting with a resumable session, identify otherwise.
    fn authenticate(&mut self, conn: &Connection) {
        let resume = match (
            self.attempt.is_reconnect(),
            self.session.session_id(),
            self.session.last_sequence(),
        ) {
            (true, Some(session_id), Some(seq)) => Some(ResumePayload {
                session_id: session_id.to_owned(),
                seq,
                token: self.config.token.clone(),
            }),
            _ => None,
        };

        match resume {
            Some(payload) => {
                info!(session_id = %payload.session_id, sequence = payload.seq, "Resuming session");
                self.send(conn, messages::resume(payload));
            }
            None => self.identify(conn),
        }
    }

    /// Start a fresh session.
    fn identify(&mut self, conn: &Connection) {
        self.session = Session::new();
        info!(compress = self.config.compress, intents = ?self.config.intents, "Identifying");

        let payload = IdentifyPayload {
            token: self.config.token.clone(),
            properties: self.config.properties.clone(),
            compress: self.config.compress,
            intents: self.config.intents,
        };
        self.send(conn, messages::identify(payload));
    }

    fn handle_invalid_session(&mut self, conn: &Connection, data: &Value) {
        let err = GatewayError::SessionInvalidated;
        warn!(
            error = %err,
            resumable = data.as_bool().unwrap_or(false),
            "Starting a new session"
        );
        self.set_state(ConnectionState::Authenticating);
        self.identify(conn);
    }

    fn handle_heartbeat_ack(&mut self) {
        match self.heartbeat.acknowledge() {
            Some(latency) => {
                debug!(latency_ms = millis(latency), "Heartbeat acknowledged");
                metrics::record_heartbeat_latency(latency.as_secs_f64());
                self.events.emit(ClientEvent::HeartbeatAck { latency });
            }
            None => debug!("Heartbeat ACK without an outstanding heartbeat"),
        }
    }

    fn handle_dispatch(
        &mut self,
        event: Option<DispatchEvent>,
        sequence: Option<u64>,
        data: Arc<Value>,
    ) {
        let Some(event) = event else {
            debug!("Dispatch without an event name");
            return;
        };

        trace!(event = event.name(), sequence = ?sequence, "Dispatch received");
        match self.router.route(&mut self.session, event, data) {
            RouteOutcome::BecameReady => self.set_state(ConnectionState::Ready),
            RouteOutcome::Resumed if self.session.is_ready() => {
                self.set_state(ConnectionState::Ready)
            }
            RouteOutcome::Resumed | RouteOutcome::Nothing => {}
        }
    }

    fn send_heartbeat(&mut self, conn: &Connection) {
        let sequence = self.session.last_sequence();
        let command = self.heartbeat.beat(sequence);
        trace!(sequence = ?sequence, "Sending heartbeat");
        self.send(conn, command);
        self.events.emit(ClientEvent::Heartbeat { sequence });
    }

    fn send<D: Serialize>(&self, conn: &Connection, command: GatewaySend<D>) {
        let text = match command.to_json() {
            Ok(text) => text,
            Err(e) => {
                error!(error = %e, op = command.op, "Failed to encode gateway command");
                return;
            }
        };
        if let Err(e) = conn.send(text) {
            debug!(error = %e, op = command.op, "Dropping command for closed connection");
        }
    }

    fn shutdown_requested(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    fn finish_shutdown(&mut self) {
        self.heartbeat.disarm();
        self.attempt.reset();
        if self.state != ConnectionState::Closed(Closure::Fatal) {
            info!("Gateway client stopped");
            self.set_state(ConnectionState::Closed(Closure::Fatal));
            self.events.emit(ClientEvent::Closed);
        }
    }

    fn set_state(&mut self, state: ConnectionState) {
        self.state = state;
        metrics::set_connection_state(state.as_str());
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Resolves once shutdown has been requested.
async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    let requested = rx.wait_for(|stop| *stop).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}
