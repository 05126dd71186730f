//! Application Startup
//!
//! Wires the gateway client, the REST message service and the optional
//! ping responder from settings.

use std::sync::Arc;

use anyhow::Result;

use crate::application::services::{HttpMessageService, MessageService, PingResponder};
use crate::config::Settings;
use crate::gateway::{ClientEvent, EventKind, GatewayClient, ShutdownHandle};
use crate::infrastructure::metrics;
use crate::infrastructure::transport::WebSocketTransport;

/// Application instance
pub struct Application {
    client: GatewayClient<WebSocketTransport>,
    messages: Arc<dyn MessageService>,
}

impl Application {
    /// Build the application from settings
    pub fn build(settings: Settings) -> Result<Self> {
        let client = GatewayClient::new(settings.gateway.client_config(), WebSocketTransport::new());

        let messages: Arc<dyn MessageService> = Arc::new(HttpMessageService::new(
            settings.rest.client_config(&settings.gateway.token),
        )?);

        let events = client.events();
        events.on(EventKind::Ready, |event| {
            if let ClientEvent::Ready {
                session_id,
                user_id,
                guilds,
            } = event
            {
                tracing::info!(%session_id, user_id = ?user_id, guilds, "Bot is ready");
            }
        });

        if let Some(command) = settings.bot.ping_command.clone() {
            tracing::info!(%command, "Ping responder enabled");
            Arc::new(PingResponder::new(
                messages.clone(),
                command,
                settings.bot.ping_reply.clone(),
            ))
            .register(&events);
        }

        Ok(Self { client, messages })
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.client.shutdown_handle()
    }

    /// REST collaborator shared with listeners.
    pub fn messages(&self) -> Arc<dyn MessageService> {
        self.messages.clone()
    }

    /// Run until Ctrl-C or a fatal gateway error
    pub async fn run_until_stopped(mut self) -> Result<()> {
        let shutdown = self.shutdown_handle();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    tracing::info!("Interrupt received, shutting down");
                    shutdown.shutdown();
                }
                Err(e) => tracing::error!(error = %e, "Failed to listen for interrupt"),
            }
        });

        let result = self.client.run().await;
        tracing::debug!(metrics = %metrics::gather_metrics(), "Final gateway metrics");
        result?;
        Ok(())
    }
}
