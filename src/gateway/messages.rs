//! Gateway Message Types
//!
//! Discord-compatible envelope format: decoding inbound frames and
//! building the outbound commands the client is responsible for.

use std::io::Read;

use flate2::read::ZlibDecoder;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::dispatch::DispatchEvent;
use crate::domain::value_objects::Snowflake;
use crate::infrastructure::transport::Frame;
use crate::shared::error::GatewayError;

/// Gateway opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum OpCode {
    /// Event dispatch
    Dispatch = 0,
    /// Heartbeat
    Heartbeat = 1,
    /// Identify
    Identify = 2,
    /// Presence update
    PresenceUpdate = 3,
    /// Resume
    Resume = 6,
    /// Reconnect
    Reconnect = 7,
    /// Invalid session
    InvalidSession = 9,
    /// Hello
    Hello = 10,
    /// Heartbeat ACK
    HeartbeatAck = 11,
}

impl OpCode {
    /// Resolve a wire opcode. Unknown values yield `None`.
    pub fn from_u64(op: u64) -> Option<Self> {
        Some(match op {
            0 => Self::Dispatch,
            1 => Self::Heartbeat,
            2 => Self::Identify,
            3 => Self::PresenceUpdate,
            6 => Self::Resume,
            7 => Self::Reconnect,
            9 => Self::InvalidSession,
            10 => Self::Hello,
            11 => Self::HeartbeatAck,
            _ => return None,
        })
    }
}

/// Incoming gateway message, as it appears on the wire
#[derive(Debug, Deserialize)]
pub struct GatewayReceive {
    pub op: u64,
    #[serde(default)]
    pub d: Value,
    #[serde(default)]
    pub s: Option<u64>,
    #[serde(default)]
    pub t: Option<String>,
}

/// A decoded envelope with its opcode and event name resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct Envelope {
    pub op: OpCode,
    pub sequence: Option<u64>,
    /// Present for dispatch envelopes only.
    pub event: Option<DispatchEvent>,
    pub data: Value,
}

/// Decode one transport frame.
///
/// Returns `Ok(None)` for opcodes this client does not know about.
pub fn decode(frame: &Frame) -> Result<Option<Envelope>, GatewayError> {
    let raw: GatewayReceive = match frame {
        Frame::Text(text) => serde_json::from_str(text)?,
        Frame::Binary(bytes) => {
            let mut text = String::new();
            ZlibDecoder::new(bytes.as_slice()).read_to_string(&mut text)?;
            serde_json::from_str(&text)?
        }
    };

    let Some(op) = OpCode::from_u64(raw.op) else {
        tracing::debug!(op = raw.op, "Ignoring unknown opcode");
        return Ok(None);
    };

    let event = match (op, raw.t) {
        (OpCode::Dispatch, Some(name)) => Some(DispatchEvent::from_name(name)),
        _ => None,
    };

    Ok(Some(Envelope {
        op,
        sequence: raw.s,
        event,
        data: raw.d,
    }))
}

/// Hello payload (op 10)
#[derive(Debug, Deserialize)]
pub struct HelloPayload {
    pub heartbeat_interval: u64,
}

/// Ready payload (dispatch READY)
#[derive(Debug, Deserialize)]
pub struct ReadyPayload {
    pub session_id: String,
    pub user: ReadyUser,
    #[serde(default)]
    pub guilds: Vec<Value>,
}

#[derive(Debug, Deserialize)]
pub struct ReadyUser {
    pub id: Snowflake,
}

/// Outgoing gateway command
#[derive(Debug, Clone, Serialize)]
pub struct GatewaySend<D: Serialize> {
    pub op: u8,
    pub d: D,
}

impl<D: Serialize> GatewaySend<D> {
    pub fn new(op: OpCode, d: D) -> Self {
        Self { op: op as u8, d }
    }

    pub fn to_json(&self) -> Result<String, GatewayError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Identify payload (op 2)
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyPayload {
    pub token: String,
    pub properties: IdentifyProperties,
    pub compress: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intents: Option<u64>,
}

/// Identify connection properties
#[derive(Debug, Clone, Serialize)]
pub struct IdentifyProperties {
    pub os: String,
    pub browser: String,
    pub device: String,
    pub referrer: String,
    pub referring_domain: String,
}

/// Resume payload (op 6)
#[derive(Debug, Clone, Serialize)]
pub struct ResumePayload {
    pub session_id: String,
    pub seq: u64,
    pub token: String,
}

/// Heartbeat command (op 1); `d` is null until a sequence has been seen.
pub fn heartbeat(sequence: Option<u64>) -> GatewaySend<Option<u64>> {
    GatewaySend::new(OpCode::Heartbeat, sequence)
}

pub fn identify(payload: IdentifyPayload) -> GatewaySend<IdentifyPayload> {
    GatewaySend::new(OpCode::Identify, payload)
}

pub fn resume(payload: ResumePayload) -> GatewaySend<ResumePayload> {
    GatewaySend::new(OpCode::Resume, payload)
}
