//! Client Event Registry
//!
//! Application code observes the gateway through named events. Listeners
//! are plain callbacks registered per [`EventKind`]; async consumers can
//! take a broadcast receiver instead and see every event.

use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use serde_json::Value;
use tokio::sync::broadcast;

use super::messages::OpCode;
use crate::domain::value_objects::Snowflake;

/// Events published by the gateway client.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Every decoded envelope, before the client acts on it.
    Raw {
        op: OpCode,
        sequence: Option<u64>,
        event: Option<String>,
        data: Arc<Value>,
    },
    /// Any dispatch, republished verbatim under its event name.
    Dispatch { name: String, data: Arc<Value> },
    /// Initial synchronization finished. Fires once per session.
    Ready {
        session_id: String,
        user_id: Option<Snowflake>,
        guilds: usize,
    },
    /// The gateway accepted a resume.
    Resumed,
    Heartbeat { sequence: Option<u64> },
    /// Round-trip latency of the last heartbeat.
    HeartbeatAck { latency: Duration },
    Error { fatal: bool, message: String },
    Disconnected { code: u16, reason: String },
    Reconnecting { attempt: u64 },
    /// The client stopped after a local shutdown.
    Closed,
}

/// Registration key for listeners.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Raw,
    Dispatch(String),
    Ready,
    Resumed,
    Heartbeat,
    HeartbeatAck,
    Error,
    Disconnected,
    Reconnecting,
    Closed,
}

impl EventKind {
    /// Key for a dispatch event name such as `MESSAGE_CREATE`.
    pub fn dispatch(name: impl Into<String>) -> Self {
        Self::Dispatch(name.into())
    }
}

impl ClientEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ClientEvent::Raw { .. } => EventKind::Raw,
            ClientEvent::Dispatch { name, .. } => EventKind::Dispatch(name.clone()),
            ClientEvent::Ready { .. } => EventKind::Ready,
            ClientEvent::Resumed => EventKind::Resumed,
            ClientEvent::Heartbeat { .. } => EventKind::Heartbeat,
            ClientEvent::HeartbeatAck { .. } => EventKind::HeartbeatAck,
            ClientEvent::Error { .. } => EventKind::Error,
            ClientEvent::Disconnected { .. } => EventKind::Disconnected,
            ClientEvent::Reconnecting { .. } => EventKind::Reconnecting,
            ClientEvent::Closed => EventKind::Closed,
        }
    }
}

pub type Listener = Arc<dyn Fn(&ClientEvent) + Send + Sync>;

/// Observer registry keyed by event kind.
pub struct EventRegistry {
    listeners: DashMap<EventKind, Vec<Listener>>,
    event_tx: broadcast::Sender<ClientEvent>,
}

impl EventRegistry {
    pub fn new() -> Self {
        let (event_tx, _) = broadcast::channel(1024);
        Self {
            listeners: DashMap::new(),
            event_tx,
        }
    }

    /// Register a listener for one kind of event.
    pub fn on<F>(&self, kind: EventKind, listener: F)
    where
        F: Fn(&ClientEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(kind)
            .or_default()
            .push(Arc::new(listener));
    }

    /// Subscribe to every event
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.event_tx.subscribe()
    }

    pub fn listener_count(&self, kind: &EventKind) -> usize {
        self.listeners.get(kind).map(|l| l.len()).unwrap_or(0)
    }

    /// Deliver an event to every listener of its kind, then to subscribers.
    pub fn emit(&self, event: ClientEvent) {
        // Snapshot so listeners may register further listeners.
        let listeners: Vec<Listener> = self
            .listeners
            .get(&event.kind())
            .map(|l| l.value().clone())
            .unwrap_or_default();

        for listener in &listeners {
            listener(&event);
        }

        let _ = self.event_tx.send(event);
    }
}

impl Default for EventRegistry {
    fn default() -> Self {
        Self::new()
    }
}
