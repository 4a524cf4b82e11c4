use std::env;
use std::sync::{Mutex as StdMutex, OnceLock};

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::Request,
    response::Response,
};
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;
use tunelink_slack::{
    client::{Channel, ChatApi, ChatError},
    signature::{RequestVerifier, SIGNATURE_HEADER, TIMESTAMP_HEADER},
};

pub const SIGNING_SECRET: &str = "test-signing-secret";

#[derive(Default)]
pub struct RecordingChat {
    sent: Mutex<Vec<(String, String)>>,
    fail_with: Option<String>,
}

impl RecordingChat {
    pub fn failing(error: &str) -> Self {
        Self { sent: Mutex::default(), fail_with: Some(error.to_owned()) }
    }

    pub async fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().await.clone()
    }
}

#[async_trait]
impl ChatApi for RecordingChat {
    async fn send_message(&self, text: &str, channel: &str) -> Result<(), ChatError> {
        if let Some(error) = &self.fail_with {
            return Err(ChatError::Api { method: "chat.postMessage", error: error.clone() });
        }
        self.sent.lock().await.push((channel.to_owned(), text.to_owned()));
        Ok(())
    }

    async fn list_channels(&self) -> Result<Option<Vec<Channel>>, ChatError> {
        Ok(Some(Vec::new()))
    }
}

pub fn signed_request(body: &str) -> Request<Body> {
    let timestamp = Utc::now().timestamp().to_string();
    let signature = RequestVerifier::new(SIGNING_SECRET.to_string().into())
        .sign(&timestamp, body.as_bytes())
        .expect("sign request");

    Request::builder()
        .method("POST")
        .uri("/slack/events")
        .header("content-type", "application/json")
        .header(TIMESTAMP_HEADER, timestamp)
        .header(SIGNATURE_HEADER, signature)
        .body(Body::from(body.to_owned()))
        .expect("request")
}

pub fn unsigned_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/slack/events")
        .header("content-type", "application/json")
        .body(Body::from(body.to_owned()))
        .expect("request")
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body bytes");
    serde_json::from_slice(&bytes).expect("json body")
}

const CONFIG_VARS: [&str; 16] = [
    "TUNELINK_SPOTIFY_CLIENT_ID",
    "TUNELINK_SPOTIFY_CLIENT_SECRET",
    "TUNELINK_SPOTIFY_REFRESH_TOKEN",
    "TUNELINK_SPOTIFY_MARKET",
    "TUNELINK_SPOTIFY_API_BASE_URL",
    "TUNELINK_SPOTIFY_ACCOUNTS_BASE_URL",
    "TUNELINK_SLACK_SIGNING_SECRET",
    "TUNELINK_SLACK_BOT_TOKEN",
    "TUNELINK_SLACK_API_BASE_URL",
    "TUNELINK_SERVER_BIND_ADDRESS",
    "TUNELINK_SERVER_PORT",
    "TUNELINK_SERVER_EVENTS_PATH",
    "TUNELINK_LOGGING_LEVEL",
    "TUNELINK_LOGGING_FORMAT",
    "TUNELINK_LOG_LEVEL",
    "TUNELINK_LOG_FORMAT",
];

/// Runs `test_fn` with every `TUNELINK_*` variable unset, restoring them afterwards.
pub fn with_clean_env<T>(test_fn: impl FnOnce() -> T) -> T {
    static ENV_LOCK: OnceLock<StdMutex<()>> = OnceLock::new();
    let _guard = ENV_LOCK
        .get_or_init(|| StdMutex::new(()))
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());

    let previous: Vec<(&str, Option<String>)> =
        CONFIG_VARS.iter().map(|key| (*key, env::var(key).ok())).collect();
    for key in CONFIG_VARS {
        env::remove_var(key);
    }

    let result = test_fn();

    for (key, value) in previous {
        match value {
            Some(value) => env::set_var(key, value),
            None => env::remove_var(key),
        }
    }
    result
}
