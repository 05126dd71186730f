//! Gateway Module
//!
//! Client side of the real-time gateway protocol:
//! - Envelope codec and outbound commands
//! - Heartbeat scheduling and acknowledgement watchdog
//! - Session state machine with identify/resume and reconnects
//! - Dispatch routing and event fan-out

pub mod client;
pub mod dispatch;
pub mod events;
pub mod heartbeat;
pub mod messages;
pub mod reconnect;

pub use client::{
    ConnectionState, Closure, GatewayClient, GatewayConfig, ShutdownHandle, USER_AGENT,
};
pub use dispatch::{DispatchEvent, DispatchRouter, RouteOutcome};
pub use events::{ClientEvent, EventKind, EventRegistry};
pub use heartbeat::{HeartbeatController, HeartbeatSignal};
pub use messages::{Envelope, OpCode};
