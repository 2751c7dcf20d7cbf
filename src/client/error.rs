//! Error type for remote API calls.

use thiserror::Error;

/// Errors raised while talking to the remote service.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response
    #[error("{method} {url}: {source}")]
    Transport {
        method: String,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-success status
    #[error("{method} {url}: {status} {message}")]
    Http {
        method: String,
        url: String,
        status: u16,
        message: String,
    },

    /// The response body was not the expected JSON shape
    #[error("decode {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The configured endpoint could not be joined with a request path
    #[error("Invalid endpoint URL: {0}")]
    InvalidUrl(String),

    /// The HTTP client could not be constructed
    #[error("Failed to build HTTP client: {0}")]
    Client(String),
}

impl ApiError {
    /// HTTP status of the failed call, if the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the service rejected the caller's credentials.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401) | Some(403))
    }
}
