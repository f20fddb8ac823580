//! Source Errors
//!
//! Failure modes shared by every adapter. A `SourceError` only ever marks
//! one source as unavailable; it never aborts a report.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    /// Connection failure or timeout
    #[error("Network error: {0}")]
    Network(String),

    /// Provider throttled the request (HTTP 429 or a rate-limit body)
    #[error("Rate limited by {provider}")]
    RateLimited { provider: String },

    /// Body did not match the expected schema
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Provider answered but has no data for the identifier
    #[error("Not found: {0}")]
    NotFound(String),

    /// Provider refused the request (bad key, bad request)
    #[error("Request rejected: {0}")]
    Rejected(String),
}

impl SourceError {
    /// Check if error is worth another attempt
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Network(_) | SourceError::RateLimited { .. })
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            SourceError::Network(format!("request timed out: {}", err.without_url()))
        } else if err.is_decode() {
            SourceError::MalformedResponse(err.without_url().to_string())
        } else {
            // Never echo the URL: query strings carry API keys
            SourceError::Network(err.without_url().to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(err: serde_json::Error) -> Self {
        SourceError::MalformedResponse(err.to_string())
    }
}
