//! Log stream error types.

/// Errors returned by a [`LogSource`](super::LogSource) for a single fetch.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Network-level failure that may succeed on retry.
    #[error("Transient fetch failure: {0}")]
    Transient(String),

    /// Failure that will not go away by retrying.
    #[error("Fetch failed: {0}")]
    Fatal(String),

    /// Log endpoint answered with a non-success status.
    #[error("Log endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
}

impl FetchError {
    /// Whether the poll loop should retry the fetch.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient(_) => true,
            Self::Fatal(_) => false,
            Self::Status { status, .. } => *status == 429 || (500..600).contains(status),
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_body() || e.is_request() {
            Self::Transient(e.to_string())
        } else {
            Self::Fatal(e.to_string())
        }
    }
}

/// Errors returned by a [`CompletionOracle`](super::CompletionOracle).
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OracleError {
    #[error("Status request failed: {0}")]
    Request(String),
    #[error("Failed to parse status: {0}")]
    Parse(String),
    #[error("{0}")]
    Other(String),
}

/// Terminal error of a log session, as seen by the consumer.
///
/// Cloneable so the stream can report it again on every read after the
/// session failed.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LogError {
    /// The session was cancelled through its cancellation token.
    #[error("Log stream cancelled")]
    Cancelled,

    /// The completion oracle failed.
    #[error("Completion check failed: {0}")]
    Oracle(#[from] OracleError),

    /// A transient fetch failure kept happening past the retry bound.
    #[error("Log fetch failed after {attempts} attempts: {last}")]
    RetriesExhausted { attempts: u32, last: FetchError },

    /// A non-retryable fetch failure.
    #[error("Log fetch failed: {0}")]
    Fetch(FetchError),

    /// The poll loop went away without reporting an outcome.
    #[error("Log poll loop terminated unexpectedly")]
    Aborted,
}

impl From<LogError> for std::io::Error {
    fn from(e: LogError) -> Self {
        Self::other(e)
    }
}
