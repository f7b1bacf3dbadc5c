//! Error types for the feed client

use reqwest::StatusCode;
use thiserror::Error;

use crate::uri::UriError;

pub type Result<T> = std::result::Result<T, ClientError>;

/// Failure of a single delivery attempt that makes the request eligible for retry
#[derive(Debug, Error)]
pub enum AttemptError {
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error("server error: {0}")]
    ServerStatus(StatusCode),
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid feed uri: {0}")]
    InvalidFeedUri(#[source] UriError),

    #[error("too many posts: {0} (max {})", crate::models::MAX_POSTS_PER_REQUEST)]
    TooManyPosts(usize),

    #[error("invalid count: {0}")]
    InvalidCount(i64),

    #[error("invalid base url: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("failed to marshal request body: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("failed to build request: {0}")]
    Build(#[source] reqwest::Error),

    #[error("max retries exceeded: {0}")]
    MaxRetriesExceeded(#[source] AttemptError),

    #[error("failed to read response body: {0}")]
    ReadBody(#[source] reqwest::Error),

    #[error("api error: {message}")]
    Api {
        status: StatusCode,
        message: String,
        error: Option<String>,
    },

    #[error("unexpected status {status}{}", body_suffix(.body))]
    UnexpectedStatus { status: StatusCode, body: String },

    #[error("failed to unmarshal response: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("request cancelled")]
    Cancelled,

    #[error("client is closed")]
    Closed,
}

fn body_suffix(body: &str) -> String {
    if body.is_empty() {
        String::new()
    } else {
        format!(": {}", body)
    }
}

impl ClientError {
    /// True for errors raised before any network call was made
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ClientError::InvalidFeedUri(_)
                | ClientError::TooManyPosts(_)
                | ClientError::InvalidCount(_)
        )
    }

    /// HTTP status of the response that produced this error, if any
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Api { status, .. } | ClientError::UnexpectedStatus { status, .. } => {
                Some(*status)
            }
            ClientError::MaxRetriesExceeded(AttemptError::ServerStatus(status)) => Some(*status),
            _ => None,
        }
    }
}
