//! Schema provisioning errors
//!
//! Fetch errors are absorbed by the provisioner and only ever logged; the
//! caller of `get_schema` sees a fallback handle instead.

use thiserror::Error;

/// Reasons a remote schema fetch failed
#[derive(Debug, Error)]
pub enum FetchError {
    /// Connection, TLS or timeout failure
    #[error("Schema request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("Schema server answered {status}")]
    Status { status: u16 },

    #[error("Schema response body is empty")]
    EmptyBody,

    /// The body exceeds the configured size cap
    #[error("Schema response exceeds {limit} bytes")]
    TooLarge { limit: u64 },

    /// No schema source URL is configured
    #[error("No schema URL configured")]
    Disabled,
}

impl FetchError {
    /// Whether another attempt could succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) => true,
            FetchError::Status { status } => *status >= 500 || *status == 429 || *status == 408,
            FetchError::EmptyBody | FetchError::TooLarge { .. } | FetchError::Disabled => false,
        }
    }
}

/// Errors constructing a provisioner
#[derive(Debug, Error)]
pub enum ProvisionerError {
    #[error("Cannot build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
