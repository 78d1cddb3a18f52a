//! Error types for card resolution.

use quill_renderer::components::ResolveError;

/// Error from a GitHub API lookup.
#[derive(Debug, thiserror::Error)]
pub enum CardError {
    /// HTTP request failed (network error, TLS, etc).
    #[error("HTTP request failed: {0}")]
    Http(#[from] ureq::Error),

    /// The API answered with an error status.
    #[error("HTTP error: {status} - {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body (may contain error details).
        body: String,
    },

    /// Response body is not the expected JSON.
    #[error("Invalid API response: {0}")]
    Json(#[from] serde_json::Error),

    /// Identifier cannot be used in an API path.
    #[error("Invalid repository identifier: {0}")]
    InvalidIdentifier(String),

    /// The agent's own deadline passed.
    #[error("Request timed out")]
    Timeout,
}

impl From<CardError> for ResolveError {
    fn from(error: CardError) -> Self {
        Self::Failed(error.to_string())
    }
}
