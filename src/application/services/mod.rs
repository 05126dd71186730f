//! Application Services
//!
//! ## Available Services
//!
//! - **MessageService**: create/edit a channel message over REST
//! - **PingResponder**: answers a command text seen on the gateway

pub mod message_service;
pub mod ping_responder;

pub use message_service::{HttpMessageService, MessageError, MessageService, RestConfig};
pub use ping_responder::PingResponder;
