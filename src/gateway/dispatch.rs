//! Dispatch routing
//!
//! Every dispatch first updates session state, then is republished to
//! listeners under its event name. Readiness is evaluated last so that
//! listeners see the guild that completed synchronization before `Ready`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::events::{ClientEvent, EventRegistry};
use super::messages::ReadyPayload;
use crate::domain::entities::{GuildState, Session};
use crate::infrastructure::metrics;

/// Dispatch event names the client itself reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchEvent {
    Ready,
    Resumed,
    GuildCreate,
    /// Anything else, carried by name.
    Other(String),
}

impl DispatchEvent {
    pub fn from_name(name: String) -> Self {
        match name.as_str() {
            "READY" => Self::Ready,
            "RESUMED" => Self::Resumed,
            "GUILD_CREATE" => Self::GuildCreate,
            _ => Self::Other(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Ready => "READY",
            Self::Resumed => "RESUMED",
            Self::GuildCreate => "GUILD_CREATE",
            Self::Other(name) => name,
        }
    }
}

/// What routing a dispatch changed about the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteOutcome {
    Nothing,
    /// Initial synchronization just completed.
    BecameReady,
    /// The gateway confirmed a resume.
    Resumed,
}

pub struct DispatchRouter {
    events: Arc<EventRegistry>,
}

impl DispatchRouter {
    pub fn new(events: Arc<EventRegistry>) -> Self {
        Self { events }
    }

    pub fn route(
        &self,
        session: &mut Session,
        event: DispatchEvent,
        data: impl Into<Arc<Value>>,
    ) -> RouteOutcome {
        let data = data.into();

        let resumed = match &event {
            DispatchEvent::Ready => {
                apply_ready(session, &data);
                false
            }
            DispatchEvent::GuildCreate => {
                match GuildState::from_payload(data.clone()) {
                    Ok(guild) => {
                        debug!(guild_id = %guild.id, unavailable = guild.unavailable, "Guild created");
                        session.upsert_guild(guild);
                    }
                    Err(e) => warn!(error = %e, "Ignoring GUILD_CREATE without a usable id"),
                }
                false
            }
            DispatchEvent::Resumed => {
                info!(session_id = ?session.session_id(), "Session resumed");
                true
            }
            DispatchEvent::Other(_) => false,
        };

        let name = event.name().to_owned();
        metrics::record_dispatch(&name);
        self.events.emit(ClientEvent::Dispatch { name, data });

        if resumed {
            self.events.emit(ClientEvent::Resumed);
            return RouteOutcome::Resumed;
        }

        if session.evaluate_readiness() {
            let guilds = session.guilds().len();
            info!(
                session_id = ?session.session_id(),
                guilds,
                "Initial guild synchronization complete"
            );
            self.events.emit(ClientEvent::Ready {
                session_id: session.session_id().unwrap_or_default().to_owned(),
                user_id: session.user_id(),
                guilds,
            });
            return RouteOutcome::BecameReady;
        }

        RouteOutcome::Nothing
    }
}

fn apply_ready(session: &mut Session, data: &Value) {
    let ready = match ReadyPayload::deserialize(data) {
        Ok(ready) => ready,
        Err(e) => {
            warn!(error = %e, "Malformed READY payload");
            return;
        }
    };

    let guilds: Vec<GuildState> = ready
        .guilds
        .into_iter()
        .filter_map(|raw| match GuildState::from_payload(raw) {
            Ok(guild) => Some(guild),
            Err(e) => {
                warn!(error = %e, "Skipping READY guild without a usable id");
                None
            }
        })
        .collect();

    info!(
        session_id = %ready.session_id,
        user_id = %ready.user.id,
        guilds = guilds.len(),
        "Received READY"
    );
    session.apply_ready(ready.session_id, ready.user.id, guilds);
}
