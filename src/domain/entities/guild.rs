//! Guild entity as seen by a gateway client.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;

use crate::domain::value_objects::Snowflake;

/// Client-side view of one guild.
///
/// Only `id` and `unavailable` matter to the session; the full payload is
/// kept verbatim so listeners can inspect whatever the server sent.
#[derive(Debug, Clone)]
pub struct GuildState {
    pub id: Snowflake,
    pub unavailable: bool,
    pub raw: Arc<Value>,
}

#[derive(Deserialize)]
struct GuildHeader {
    id: Snowflake,
    #[serde(default)]
    unavailable: Option<bool>,
}

impl GuildState {
    /// Build a guild from a ready-list entry or a guild-create payload.
    ///
    /// Accepts an already shared payload so a dispatch and the guild it
    /// produced can point at the same value.
    pub fn from_payload(raw: impl Into<Arc<Value>>) -> Result<Self, serde_json::Error> {
        let raw = raw.into();
        let header = GuildHeader::deserialize(&*raw)?;
        Ok(Self {
            id: header.id,
            unavailable: header.unavailable.unwrap_or(false),
            raw,
        })
    }

    pub fn is_available(&self) -> bool {
        !self.unavailable
    }
}
