//! Errors returned by API calls.

use thiserror::Error;

/// Failure of a single API call (metadata lookup or asset download).
#[derive(Debug, Error)]
pub enum ApiError {
    /// Curl reported an error (connection refused, DNS, TLS, ...).
    #[error("transport: {0}")]
    Curl(#[from] curl::Error),

    /// The server answered with a non-2xx status.
    #[error("GET {url} returned HTTP {status}")]
    Http { status: u32, url: String },

    /// The response body was not the JSON shape we expected.
    #[error("invalid JSON from {url}: {source}")]
    Json {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// Endpoint could not be joined onto the base URL.
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// Writing a downloaded body to disk failed.
    #[error("storage: {0}")]
    Storage(#[from] std::io::Error),

    /// The authentication handshake was rejected or returned no token.
    #[error("authentication failed: {0}")]
    Auth(String),
}

impl ApiError {
    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u32> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
