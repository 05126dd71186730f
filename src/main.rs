//! # Gateway Client
//!
//! Entry point for a bot process. Initializes:
//! - Tracing/logging subsystem
//! - Configuration loading
//! - Gateway client and REST message service

use anyhow::Result;
use tracing::info;

use gateway_client::config::Settings;
use gateway_client::startup::Application;
use gateway_client::telemetry::{self, LogFormat};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing(LogFormat::from_env())?;

    info!("Starting gateway client...");

    let settings = Settings::load()?;
    info!(
        gateway = %settings.gateway.url,
        version = settings.gateway.version,
        compress = settings.gateway.compress,
        environment = %settings.environment,
        "Configuration loaded"
    );

    let application = Application::build(settings)?;
    application.run_until_stopped().await?;

    info!("Shutdown complete");
    Ok(())
}
