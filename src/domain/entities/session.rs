//! Gateway session entity.
//!
//! Holds everything the client knows about the logical session: the
//! identifiers needed to resume, the last sequence number observed, and
//! the guild set that decides when initial synchronization is complete.

use std::collections::HashMap;

use crate::domain::entities::GuildState;
use crate::domain::value_objects::Snowflake;

/// One logical gateway session.
///
/// A new value is created for every fresh identify. Resuming keeps the
/// existing value alive, which is what lets `last_sequence` survive a
/// reconnect.
#[derive(Debug, Default)]
pub struct Session {
    session_id: Option<String>,
    last_sequence: Option<u64>,
    user_id: Option<Snowflake>,
    guilds: HashMap<Snowflake, GuildState>,
    /// READY has been received for this session.
    handshake_complete: bool,
    /// Readiness has been signalled. Never reset for this value.
    ready: bool,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn last_sequence(&self) -> Option<u64> {
        self.last_sequence
    }

    pub fn user_id(&self) -> Option<Snowflake> {
        self.user_id
    }

    pub fn guilds(&self) -> &HashMap<Snowflake, GuildState> {
        &self.guilds
    }

    pub fn guild(&self, id: Snowflake) -> Option<&GuildState> {
        self.guilds.get(&id)
    }

    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Record a sequence number carried by an inbound envelope.
    ///
    /// The stored value never decreases.
    pub fn observe_sequence(&mut self, sequence: u64) {
        self.last_sequence = Some(match self.last_sequence {
            Some(current) => current.max(sequence),
            None => sequence,
        });
    }

    /// A resume needs both the session id and a sequence to replay from.
    pub fn can_resume(&self) -> bool {
        self.session_id.is_some() && self.last_sequence.is_some()
    }

    /// Apply the READY handshake: capture identifiers and replace the
    /// guild set wholesale.
    pub fn apply_ready(
        &mut self,
        session_id: String,
        user_id: Snowflake,
        guilds: impl IntoIterator<Item = GuildState>,
    ) {
        self.session_id = Some(session_id);
        self.user_id = Some(user_id);
        self.guilds = guilds.into_iter().map(|g| (g.id, g)).collect();
        self.handshake_complete = true;
    }

    /// Insert or replace a guild by id.
    pub fn upsert_guild(&mut self, guild: GuildState) -> Option<GuildState> {
        self.guilds.insert(guild.id, guild)
    }

    pub fn unavailable_guilds(&self) -> usize {
        self.guilds.values().filter(|g| g.unavailable).count()
    }

    /// Returns `true` exactly once per session: the first time READY has
    /// been seen and every known guild is available.
    pub fn evaluate_readiness(&mut self) -> bool {
        if self.ready || !self.handshake_complete || self.unavailable_guilds() > 0 {
            return false;
        }
        self.ready = true;
        true
    }
}
