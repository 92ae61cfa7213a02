//! Job completion oracles.
//!
//! The poll loop cannot tell from the log alone whether an unframed log is
//! complete, so it asks an oracle.

use std::collections::HashSet;
use std::future::Future;

use async_trait::async_trait;

use super::error::OracleError;
use crate::transport::Client;

/// Reports whether the job producing a log has finished.
#[async_trait]
pub trait CompletionOracle: Send + Sync {
    async fn check(&self) -> Result<bool, OracleError>;
}

#[async_trait]
impl<T: CompletionOracle + ?Sized> CompletionOracle for Box<T> {
    async fn check(&self) -> Result<bool, OracleError> {
        (**self).check().await
    }
}

/// Oracle backed by a caller-supplied async function.
pub struct FnOracle<F> {
    f: F,
}

impl<F> std::fmt::Debug for FnOracle<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnOracle").finish_non_exhaustive()
    }
}

/// Wrap a closure returning a completion future as an oracle.
pub fn oracle_fn<F, Fut>(f: F) -> FnOracle<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, OracleError>> + Send,
{
    FnOracle { f }
}

#[async_trait]
impl<F, Fut> CompletionOracle for FnOracle<F>
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<bool, OracleError>> + Send,
{
    async fn check(&self) -> Result<bool, OracleError> {
        (self.f)().await
    }
}

/// Oracle for logs that only end with their END marker.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverDone;

#[async_trait]
impl CompletionOracle for NeverDone {
    async fn check(&self) -> Result<bool, OracleError> {
        Ok(false)
    }
}

/// Polls a resource and compares its `status` attribute with a set of
/// terminal statuses.
#[derive(Debug, Clone)]
pub struct StatusOracle {
    client: Client,
    path: String,
    terminal: HashSet<String>,
}

impl StatusOracle {
    #[must_use]
    pub fn new(client: Client, path: impl Into<String>, terminal: HashSet<String>) -> Self {
        Self {
            client,
            path: path.into(),
            terminal,
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Read `data.attributes.status` out of a JSON:API document.
    ///
    /// # Errors
    ///
    /// Returns `OracleError::Parse` if the document carries no status.
    pub fn status_of(document: &serde_json::Value) -> Result<&str, OracleError> {
        document["data"]["attributes"]["status"]
            .as_str()
            .ok_or_else(|| OracleError::Parse("no data.attributes.status in response".to_string()))
    }
}

#[async_trait]
impl CompletionOracle for StatusOracle {
    async fn check(&self) -> Result<bool, OracleError> {
        let document = self
            .client
            .get_json(&self.path)
            .await
            .map_err(|e| OracleError::Request(e.to_string()))?;
        let status = Self::status_of(&document)?;
        let done = self.terminal.contains(status);
        tracing::debug!(path = %self.path, status, done, "Checked job status");
        Ok(done)
    }
}
