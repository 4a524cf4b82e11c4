use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use tunelink_core::config::SlackConfig;
use tunelink_core::ApplicationError;

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("slack `{method}` request failed: {source}")]
    Transport {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("slack `{method}` returned {status}")]
    Status { method: &'static str, status: StatusCode },
    #[error("slack `{method}` response could not be decoded: {source}")]
    Decode {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("slack `{method}` reported error `{error}`")]
    Api { method: &'static str, error: String },
}

/// Slack error codes meaning the bot token itself is wrong, not that Slack is unavailable.
const CREDENTIAL_ERRORS: [&str; 5] =
    ["not_authed", "invalid_auth", "account_inactive", "token_revoked", "missing_scope"];

impl ChatError {
    pub fn is_credential_failure(&self) -> bool {
        match self {
            Self::Api { error, .. } => CREDENTIAL_ERRORS.contains(&error.as_str()),
            Self::Status { status, .. } => *status == StatusCode::UNAUTHORIZED,
            Self::Transport { .. } | Self::Decode { .. } => false,
        }
    }
}

impl From<ChatError> for ApplicationError {
    fn from(value: ChatError) -> Self {
        if value.is_credential_failure() {
            ApplicationError::Configuration(value.to_string())
        } else {
            ApplicationError::Integration(value.to_string())
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub is_member: bool,
    #[serde(default)]
    pub is_private: bool,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatApi: Send + Sync {
    async fn send_message(&self, text: &str, channel: &str) -> Result<(), ChatError>;
    /// `None` when the platform answers with `ok: false`.
    async fn list_channels(&self) -> Result<Option<Vec<Channel>>, ChatError>;
}

#[derive(Serialize)]
struct PostMessageRequest<'a> {
    channel: &'a str,
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChannelsResponse {
    ok: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    channels: Vec<Channel>,
    #[serde(default)]
    response_metadata: Option<ResponseMetadata>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    next_cursor: String,
}

const CHANNEL_PAGE_SIZE: u32 = 200;

/// Slack Web API client authenticated with the bot token.
pub struct SlackWebClient {
    http: Client,
    api_base_url: String,
    bot_token: SecretString,
}

impl SlackWebClient {
    pub fn new(config: &SlackConfig) -> Self {
        Self {
            http: Client::new(),
            api_base_url: config.api_base_url.trim_end_matches('/').to_string(),
            bot_token: config.bot_token.clone(),
        }
    }

    fn url(&self, method: &str) -> String {
        format!("{}/{method}", self.api_base_url)
    }

    async fn decode<T>(method: &'static str, response: reqwest::Response) -> Result<T, ChatError>
    where
        T: serde::de::DeserializeOwned,
    {
        let status = response.status();
        if !status.is_success() {
            return Err(ChatError::Status { method, status });
        }
        response.json::<T>().await.map_err(|source| ChatError::Decode { method, source })
    }
}

#[async_trait]
impl ChatApi for SlackWebClient {
    async fn send_message(&self, text: &str, channel: &str) -> Result<(), ChatError> {
        const METHOD: &str = "chat.postMessage";

        let response = self
            .http
            .post(self.url(METHOD))
            .bearer_auth(self.bot_token.expose_secret())
            .json(&PostMessageRequest { channel, text })
            .send()
            .await
            .map_err(|source| ChatError::Transport { method: METHOD, source })?;

        let body: ApiResponse = Self::decode(METHOD, response).await?;
        if !body.ok {
            return Err(ChatError::Api {
                method: METHOD,
                error: body.error.unwrap_or_else(|| "unknown_error".to_string()),
            });
        }

        debug!(event_name = "egress.slack.message_posted", channel, "slack message posted");
        Ok(())
    }

    /// Public channels only, so `channels:read` is the one scope needed.
    /// Follows `next_cursor` until the listing is exhausted.
    async fn list_channels(&self) -> Result<Option<Vec<Channel>>, ChatError> {
        const METHOD: &str = "conversations.list";

        let mut channels = Vec::new();
        let mut cursor = String::new();
        loop {
            let mut query = vec![
                ("exclude_archived", "true".to_string()),
                ("types", "public_channel".to_string()),
                ("limit", CHANNEL_PAGE_SIZE.to_string()),
            ];
            if !cursor.is_empty() {
                query.push(("cursor", cursor.clone()));
            }

            let response = self
                .http
                .get(self.url(METHOD))
                .bearer_auth(self.bot_token.expose_secret())
                .query(&query)
                .send()
                .await
                .map_err(|source| ChatError::Transport { method: METHOD, source })?;

            let body: ChannelsResponse = Self::decode(METHOD, response).await?;
            if !body.ok {
                warn!(
                    event_name = "egress.slack.channels_unavailable",
                    error = body.error.as_deref().unwrap_or("unknown_error"),
                    "slack refused to list channels"
                );
                return Ok(None);
            }

            channels.extend(body.channels);
            cursor = body.response_metadata.map(|meta| meta.next_cursor).unwrap_or_default();
            if cursor.trim().is_empty() {
                break;
            }
        }

        debug!(
            event_name = "egress.slack.channels_listed",
            channel_count = channels.len(),
            "slack channels listed"
        );
        Ok(Some(channels))
    }
}
