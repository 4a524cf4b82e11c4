use reqwest::StatusCode;
use thiserror::Error;
use tunelink_core::ApplicationError;

#[derive(Debug, Error)]
pub enum SpotifyError {
    #[error("spotify request to `{endpoint}` failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("spotify `{endpoint}` returned {status}: {body}")]
    Status { endpoint: String, status: StatusCode, body: String },
    #[error("spotify `{endpoint}` response could not be decoded: {source}")]
    Decode {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("spotify token endpoint returned an empty access token")]
    EmptyToken,
}

impl SpotifyError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<SpotifyError> for ApplicationError {
    fn from(value: SpotifyError) -> Self {
        ApplicationError::Integration(value.to_string())
    }
}
