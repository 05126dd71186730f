//! # Gateway Client Library
//!
//! A resilient client for Discord-compatible real-time gateways:
//! - Hello / identify / resume handshake
//! - Heartbeats with an acknowledgement watchdog
//! - Automatic reconnects that resume the session where possible
//! - Readiness tracking across initial guild synchronization
//! - Event fan-out to application listeners
//! - A small REST collaborator for posting and editing messages
//!
//! ## Module Structure
//!
//! ```text
//! gateway_client/
//! +-- config/         Configuration management
//! +-- domain/         Session and guild state, snowflake ids
//! +-- application/    Message service, ping responder, DTOs
//! +-- infrastructure/ WebSocket transport and Prometheus metrics
//! +-- gateway/        Protocol codec, heartbeat, session state machine
//! +-- shared/         Error types
//! ```

// Configuration module
pub mod config;

// Domain layer - session state
pub mod domain;

// Application layer - REST-backed services
pub mod application;

// Infrastructure layer - transport and metrics
pub mod infrastructure;

// Gateway protocol client
pub mod gateway;

// Shared utilities
pub mod shared;

// Application startup
pub mod startup;

// Telemetry and observability
pub mod telemetry;
