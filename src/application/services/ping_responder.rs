//! Ping Responder
//!
//! Replies to a configured command text seen in `MESSAGE_CREATE`. Replies
//! go out on their own task so the gateway loop never waits on REST.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tokio::task::JoinHandle;

use super::message_service::MessageService;
use crate::domain::value_objects::Snowflake;
use crate::gateway::{ClientEvent, EventKind, EventRegistry};

pub const MESSAGE_CREATE: &str = "MESSAGE_CREATE";

#[derive(Deserialize)]
struct IncomingMessage {
    channel_id: Snowflake,
    #[serde(default)]
    content: String,
    #[serde(default)]
    author: Option<IncomingAuthor>,
}

#[derive(Deserialize)]
struct IncomingAuthor {
    #[serde(default)]
    bot: bool,
}

pub struct PingResponder {
    service: Arc<dyn MessageService>,
    command: String,
    reply: String,
}

impl PingResponder {
    pub fn new(
        service: Arc<dyn MessageService>,
        command: impl Into<String>,
        reply: impl Into<String>,
    ) -> Self {
        Self {
            service,
            command: command.into(),
            reply: reply.into(),
        }
    }

    /// Channel to answer in, if `data` is the command from a human author.
    pub fn matches(&self, data: &Value) -> Option<Snowflake> {
        let message = IncomingMessage::deserialize(data).ok()?;
        if message.author.is_some_and(|a| a.bot) {
            return None;
        }
        (message.content.trim() == self.command).then_some(message.channel_id)
    }

    /// Send the reply in the background.
    pub fn respond(&self, channel_id: Snowflake) -> JoinHandle<()> {
        let service = self.service.clone();
        let reply = self.reply.clone();
        tokio::spawn(async move {
            match service.send_message(channel_id, &reply, None).await {
                Ok(message) => {
                    tracing::info!(%channel_id, message_id = %message.id, "Replied to ping")
                }
                Err(e) => tracing::warn!(%channel_id, error = %e, "Failed to reply to ping"),
            }
        })
    }

    /// Listen for the command on `events`.
    pub fn register(self: Arc<Self>, events: &EventRegistry) {
        events.on(EventKind::dispatch(MESSAGE_CREATE), move |event| {
            if let ClientEvent::Dispatch { data, .. } = event {
                if let Some(channel_id) = self.matches(data) {
                    self.respond(channel_id);
                }
            }
        });
    }
}
