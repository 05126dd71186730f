//! Response DTOs
//!
//! Data structures for REST response bodies.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::value_objects::Snowflake;

/// Message returned by the create and edit endpoints.
///
/// Only the fields this client reads are typed; the server may send more.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub id: Snowflake,
    pub channel_id: Snowflake,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub author: Option<MessageAuthor>,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub edited_timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageAuthor {
    pub id: Snowflake,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub bot: bool,
}

impl MessageResponse {
    pub fn is_edited(&self) -> bool {
        self.edited_timestamp.is_some()
    }
}
