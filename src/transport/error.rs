//! Transport error types.

/// Errors from API requests.
#[derive(thiserror::Error, Debug)]
pub enum TransportError {
    #[error("API token not configured (env: {0})")]
    MissingToken(String),
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Failed to build HTTP client: {0}")]
    Build(String),
    #[error("API request failed: {0}")]
    Request(String),
    #[error("API request timed out")]
    Timeout,
    #[error("API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse response: {0}")]
    Parse(String),
}
