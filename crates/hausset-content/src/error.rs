//! Errors raised while fetching content or submitting the contact form.

use hausset_core::ValidationErrors;
use thiserror::Error;

/// Result type for content fetches.
pub type Result<T> = std::result::Result<T, ContentError>;

/// Failure of a single content request.
#[derive(Debug, Error)]
pub enum ContentError {
    /// The request could not be completed (unreachable host, timeout, reset).
    #[error("network error for {url}: {message}")]
    Network { url: String, message: String },

    /// The server answered with a non-success status.
    #[error("{url} answered HTTP {status}")]
    Status { url: String, status: u16 },

    /// The body is not JSON or does not match the content model.
    #[error("malformed body from {url}: {source}")]
    Parse {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP client could not be constructed.
    #[error("HTTP client error: {0}")]
    Client(String),
}

impl ContentError {
    pub(crate) fn network(url: &str, err: &reqwest::Error) -> Self {
        Self::Network {
            url: url.to_string(),
            message: err.to_string(),
        }
    }

    /// Network-class failure: unreachable or non-success status.
    #[must_use]
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::Status { .. })
    }

    /// Malformed response body.
    #[must_use]
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Failure of a contact submission. Every variant displays as a message fit
/// for the visitor; none of them is retried automatically.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// One or more fields were rejected.
    #[error("{0}")]
    Validation(ValidationErrors),

    /// The mail transport is unavailable or sending failed.
    #[error("{0}")]
    Delivery(String),

    /// Too many submissions from this client.
    #[error("{0}")]
    RateLimited(String),

    /// The relay could not be reached.
    #[error("Failed to send message. Please try again later.")]
    Network(#[source] ContentError),
}
