//! Application settings and configuration structures.

use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::application::services::RestConfig;
use crate::gateway::client::default_properties;
use crate::gateway::GatewayConfig;

/// Root configuration structure containing all application settings.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Gateway connection configuration
    pub gateway: GatewaySettings,

    /// REST API configuration
    pub rest: RestSettings,

    /// Example bot behaviour
    pub bot: BotSettings,

    /// Current environment (development, staging, production)
    pub environment: String,
}

/// Gateway connection configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    /// Base gateway URL, without query string parameters
    pub url: String,

    /// Bot token
    pub token: String,

    /// Gateway protocol version
    pub version: u8,

    /// Request zlib-compressed payloads
    pub compress: bool,

    /// Intents bitmask; omitted from identify when unset
    #[serde(default)]
    pub intents: Option<u64>,

    /// Pause between failed connection attempts in milliseconds
    pub connect_retry_delay_ms: u64,

    /// Identify `referrer` property
    pub referrer: String,

    /// Identify `referring_domain` property
    pub referring_domain: String,
}

/// REST API configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RestSettings {
    pub base_url: String,
    pub api_version: u8,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

/// Example bot behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct BotSettings {
    /// Command text to answer, e.g. `!ping`. Disabled when unset.
    #[serde(default)]
    pub ping_command: Option<String>,

    pub ping_reply: String,
}

impl Settings {
    /// Load settings from environment variables and configuration files.
    ///
    /// The loading order is:
    /// 1. config/default.toml (base configuration)
    /// 2. config/{RUN_ENV}.toml (environment-specific overrides)
    /// 3. Environment variables (highest priority)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if configuration cannot be loaded or parsed,
    /// or if no token is configured.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let environment = std::env::var("RUN_ENV").unwrap_or_else(|_| "development".into());

        Config::builder()
            .set_default("environment", environment.clone())?
            .set_default("gateway.url", "wss://gateway.discord.gg/")?
            .set_default("gateway.token", "")?
            .set_default("gateway.version", 6)?
            .set_default("gateway.compress", true)?
            .set_default("gateway.connect_retry_delay_ms", 5000_i64)?
            .set_default("gateway.referrer", "")?
            .set_default("gateway.referring_domain", "")?
            .set_default("rest.base_url", "https://discordapp.com/api")?
            .set_default("rest.api_version", 6)?
            .set_default("rest.timeout_secs", 10)?
            .set_default("bot.ping_reply", "pong")?
            // Load from config files
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", environment)).required(false))
            // APP__GATEWAY__VERSION=9 -> gateway.version = 9
            .add_source(
                Environment::default()
                    .prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("gateway.token", std::env::var("BOT_TOKEN").ok())?
            .set_override_option("gateway.url", std::env::var("GATEWAY_URL").ok())?
            .build()?
            .try_deserialize()
            .and_then(|settings: Self| {
                settings.validate()?;
                Ok(settings)
            })
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.token.trim().is_empty() {
            return Err(ConfigError::Message(
                "A bot token is required: set BOT_TOKEN or gateway.token".into(),
            ));
        }
        if self.gateway.version == 0 || self.rest.api_version == 0 {
            return Err(ConfigError::Message(
                "Protocol versions must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl GatewaySettings {
    /// Build the client configuration, including the versioned URL.
    pub fn client_config(&self) -> GatewayConfig {
        let mut config = GatewayConfig::new(
            GatewayConfig::gateway_url(&self.url, self.version),
            self.token.clone(),
        );
        config.compress = self.compress;
        config.intents = self.intents;
        config.connect_retry_delay = Duration::from_millis(self.connect_retry_delay_ms);

        let mut properties = default_properties();
        properties.referrer = self.referrer.clone();
        properties.referring_domain = self.referring_domain.clone();
        config.properties = properties;
        config
    }
}

impl RestSettings {
    pub fn client_config(&self, token: &str) -> RestConfig {
        RestConfig {
            base_url: self.base_url.clone(),
            api_version: self.api_version,
            token: token.to_owned(),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}
