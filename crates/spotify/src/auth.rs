use std::time::{Duration, Instant};

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info};
use tunelink_core::config::SpotifyConfig;

use crate::error::SpotifyError;

const TOKEN_ENDPOINT: &str = "api/token";
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GrantKind {
    ClientCredentials,
    RefreshToken,
}

impl GrantKind {
    fn as_str(&self) -> &'static str {
        match self {
            Self::ClientCredentials => "client_credentials",
            Self::RefreshToken => "refresh_token",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
    /// Present when the accounts service rotates the user's refresh token.
    #[serde(default)]
    refresh_token: Option<String>,
}

fn default_expires_in() -> u64 {
    3600
}

struct CachedToken {
    access_token: SecretString,
    expires_at: Instant,
}

struct TokenState {
    cached: Option<CachedToken>,
    refresh_token: Option<SecretString>,
}

/// Issues and caches access tokens from the Spotify accounts service.
///
/// Uses the client-credentials grant unless a user refresh token is
/// configured. A token is reused until [`EXPIRY_MARGIN`] before it expires.
/// A rotated refresh token replaces the configured one for later grants.
pub struct TokenProvider {
    http: Client,
    token_url: String,
    client_id: SecretString,
    client_secret: SecretString,
    grant: GrantKind,
    state: Mutex<TokenState>,
}

impl TokenProvider {
    pub fn new(http: Client, config: &SpotifyConfig) -> Self {
        Self {
            http,
            token_url: format!(
                "{}/{TOKEN_ENDPOINT}",
                config.accounts_base_url.trim_end_matches('/')
            ),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            grant: if config.refresh_token.is_some() {
                GrantKind::RefreshToken
            } else {
                GrantKind::ClientCredentials
            },
            state: Mutex::new(TokenState {
                cached: None,
                refresh_token: config.refresh_token.clone(),
            }),
        }
    }

    pub fn grant_kind(&self) -> GrantKind {
        self.grant
    }

    pub async fn access_token(&self) -> Result<SecretString, SpotifyError> {
        let mut state = self.state.lock().await;
        if let Some(token) = state.cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
            debug!(event_name = "egress.spotify.token_expired", "cached spotify token expired");
        }

        let response = self.request_token(state.refresh_token.as_ref()).await?;
        if let Some(rotated) = response.refresh_token.filter(|token| !token.is_empty()) {
            debug!(event_name = "egress.spotify.refresh_token_rotated", "spotify refresh token rotated");
            state.refresh_token = Some(rotated.into());
        }

        let lifetime = Duration::from_secs(response.expires_in).saturating_sub(EXPIRY_MARGIN);
        let access_token: SecretString = response.access_token.into();
        state.cached =
            Some(CachedToken { access_token: access_token.clone(), expires_at: Instant::now() + lifetime });
        Ok(access_token)
    }

    async fn request_token(
        &self,
        refresh_token: Option<&SecretString>,
    ) -> Result<TokenResponse, SpotifyError> {
        let grant = self.grant;
        let mut form = vec![("grant_type", grant.as_str().to_string())];
        if let Some(refresh_token) = refresh_token {
            form.push(("refresh_token", refresh_token.expose_secret().to_string()));
        }

        let response = self
            .http
            .post(&self.token_url)
            .basic_auth(self.client_id.expose_secret(), Some(self.client_secret.expose_secret()))
            .form(&form)
            .send()
            .await
            .map_err(|source| SpotifyError::Transport {
                endpoint: TOKEN_ENDPOINT.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SpotifyError::Status { endpoint: TOKEN_ENDPOINT.to_string(), status, body });
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|source| SpotifyError::Decode { endpoint: TOKEN_ENDPOINT.to_string(), source })?;
        if token.access_token.is_empty() {
            return Err(SpotifyError::EmptyToken);
        }

        info!(
            event_name = "egress.spotify.token_issued",
            grant_type = grant.as_str(),
            expires_in = token.expires_in,
            "spotify access token issued"
        );

        Ok(token)
    }
}
