use thiserror::Error;

/// Failure talking to the media server or the catalog provider
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("{url} returned HTTP {status}")]
    Status { status: u16, url: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("no reachable Plex server found")]
    NoServer,

    #[error("invalid token: {0}")]
    InvalidToken(String),
}

impl SourceError {
    pub fn decode(message: impl Into<String>) -> Self {
        SourceError::Decode(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::Status { status: 404, .. })
    }
}
