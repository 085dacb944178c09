//! Error types for docsync-server

use std::time::Duration;

/// Result type for docsync-server operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur talking to the content server
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Topic not found: {url}")]
    NotFound { url: String },

    #[error("Rate limited by content server while requesting {url}")]
    RateLimited {
        url: String,
        retry_after: Option<Duration>,
    },

    #[error("Content server returned {status} for {url}: {message}")]
    Http {
        url: String,
        status: u16,
        message: String,
    },

    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },

    #[error("Unexpected response from {url}: {message}")]
    UnexpectedResponse { url: String, message: String },

    #[error("Not a topic URL: {url}")]
    InvalidUrl { url: String },
}

impl Error {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Transport { .. } => true,
            Self::Http { status, .. } => *status >= 500,
            Self::NotFound { .. } | Self::UnexpectedResponse { .. } | Self::InvalidUrl { .. } => {
                false
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
