//! Message Service
//!
//! Posts or edits a single channel message over the REST API. One request
//! per call; no retry and no rate-limit handling.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::AUTHORIZATION;
use reqwest::Method;

use crate::application::dto::{CreateMessageRequest, MessageResponse};
use crate::domain::value_objects::Snowflake;
use crate::gateway::USER_AGENT;

/// Message service trait
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageService: Send + Sync {
    /// Send `content` to a channel, or replace the content of message
    /// `edit` when given.
    async fn send_message(
        &self,
        channel_id: Snowflake,
        content: &str,
        edit: Option<Snowflake>,
    ) -> Result<MessageResponse, MessageError>;
}

/// Message service errors
#[derive(Debug, thiserror::Error)]
pub enum MessageError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server responded with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Where and how to reach the REST API.
#[derive(Debug, Clone)]
pub struct RestConfig {
    pub base_url: String,
    pub api_version: u8,
    pub token: String,
    pub timeout: Duration,
}

/// MessageService implementation backed by `reqwest`.
#[derive(Debug, Clone)]
pub struct HttpMessageService {
    client: reqwest::Client,
    api_root: String,
    authorization: String,
}

impl HttpMessageService {
    pub fn new(config: RestConfig) -> Result<Self, MessageError> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_root: format!(
                "{}/v{}",
                config.base_url.trim_end_matches('/'),
                config.api_version
            ),
            authorization: format!("Bot {}", config.token),
        })
    }

    fn endpoint(&self, channel_id: Snowflake, edit: Option<Snowflake>) -> (Method, String) {
        match edit {
            Some(message_id) => (
                Method::PATCH,
                format!("{}/channels/{}/messages/{}", self.api_root, channel_id, message_id),
            ),
            None => (
                Method::POST,
                format!("{}/channels/{}/messages", self.api_root, channel_id),
            ),
        }
    }
}

#[async_trait]
impl MessageService for HttpMessageService {
    async fn send_message(
        &self,
        channel_id: Snowflake,
        content: &str,
        edit: Option<Snowflake>,
    ) -> Result<MessageResponse, MessageError> {
        let (method, url) = self.endpoint(channel_id, edit);
        tracing::debug!(%method, %url, "Sending channel message");

        let response = self
            .client
            .request(method, &url)
            .header(AUTHORIZATION, &self.authorization)
            .json(&CreateMessageRequest {
                content: content.to_owned(),
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(status = status.as_u16(), %url, "Message request rejected");
            return Err(MessageError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<MessageResponse>().await?)
    }
}
