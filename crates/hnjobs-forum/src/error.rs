//! Error types for the forum client.

use thiserror::Error;

use hnjobs_core::error::{AppError, ErrorKind};

/// Result type for forum client operations.
pub type ForumResult<T> = std::result::Result<T, ForumError>;

/// Forum client errors.
#[derive(Debug, Error)]
pub enum ForumError {
    /// Transport failure (connection refused, timeout, TLS).
    #[error("Forum request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Non-2xx response.
    #[error("Forum API returned {status} for {url}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Requested URL.
        url: String,
    },

    /// The response body was not the expected JSON.
    #[error("Failed to decode forum response: {0}")]
    Decode(#[from] serde_json::Error),

    /// The API returned `null` for the requested user or item.
    #[error("Forum item or user '{0}' not found")]
    NotFound(String),

    /// An item expected to be a story was something else.
    #[error("Item {0} is not a story")]
    ExpectedStory(i64),

    /// An item expected to be a comment was something else.
    #[error("Item {0} is not a comment")]
    ExpectedComment(i64),
}

impl From<ForumError> for AppError {
    fn from(err: ForumError) -> Self {
        let kind = match &err {
            ForumError::NotFound(_) => ErrorKind::NotFound,
            ForumError::ExpectedStory(_) | ForumError::ExpectedComment(_) => ErrorKind::Validation,
            ForumError::Decode(_) => ErrorKind::Serialization,
            ForumError::Status { status: 429, .. } => ErrorKind::RateLimit,
            ForumError::Status { status, .. } if *status >= 500 => ErrorKind::ServiceUnavailable,
            ForumError::Http(_) | ForumError::Status { .. } => ErrorKind::ExternalService,
        };
        let message = err.to_string();
        AppError::with_source(kind, message, err)
    }
}
