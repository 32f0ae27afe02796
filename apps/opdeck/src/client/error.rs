//! Network error types.

use thiserror::Error;

/// Errors surfaced by the rate-limited client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NetworkError {
    #[error("request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Transport(String),

    #[error("invalid response body: {0}")]
    Decode(String),

    #[error("remote service error: {0}")]
    Remote(String),

    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl NetworkError {
    /// HTTP status of the failed response, if one was received.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure is worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Status { status, .. } => is_retryable_status(*status),
            Self::Transport(_) => true,
            Self::Decode(_) | Self::Remote(_) | Self::InvalidUrl(_) => false,
        }
    }
}

/// 429 and every 5xx are retried; all other statuses fail immediately.
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}
