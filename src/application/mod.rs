//! Application Layer
//!
//! Services built on top of the gateway client and the REST API, plus
//! the DTOs they exchange.

pub mod dto;
pub mod services;
