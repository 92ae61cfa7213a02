//! The fetch/complete polling loop behind a log stream.
//!
//! One loop runs per session and is the only writer of the offset and the
//! framer state. Fetches and completion checks are strictly serialized: each
//! cycle fetches once, then asks the oracle if its deadline has passed, then
//! waits for the next fetch.

use std::future::Future;

use tokio::sync::mpsc::UnboundedSender;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::error::{FetchError, LogError};
use super::framer::MarkerFramer;
use super::oracle::CompletionOracle;
use super::retry::Backoff;
use super::source::LogSource;
use super::stream::Delivery;
use crate::config::ReaderConfig;

/// How a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    /// The END marker closed the frame.
    EndMarker,
    /// The oracle reported completion and the remaining bytes were drained.
    Completed,
    /// The consumer dropped the stream.
    ConsumerGone,
    /// The session failed with a terminal error.
    Failed(LogError),
}

/// Phase of a running loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    /// Fetching on the regular interval and checking for completion.
    Running,
    /// The job is finished; fetching back-to-back until caught up.
    Draining,
}

/// Drives fetch → frame → deliver cycles for one log session.
pub(crate) struct PollLoop<S, O> {
    source: S,
    oracle: O,
    framer: MarkerFramer,
    config: ReaderConfig,
    offset: u64,
    tx: UnboundedSender<Delivery>,
    cancel: CancellationToken,
}

impl<S, O> PollLoop<S, O>
where
    S: LogSource,
    O: CompletionOracle,
{
    pub(crate) fn new(
        source: S,
        oracle: O,
        config: ReaderConfig,
        tx: UnboundedSender<Delivery>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            oracle,
            framer: MarkerFramer::new(config.framing),
            config,
            offset: 0,
            tx,
            cancel,
        }
    }

    /// Run the session to its end and report the outcome to the consumer.
    pub(crate) async fn run(mut self) -> SessionOutcome {
        tracing::info!("Log session started");

        let outcome = match self.drive().await {
            Ok(outcome) => outcome,
            Err(e) => SessionOutcome::Failed(e),
        };

        match &outcome {
            SessionOutcome::EndMarker | SessionOutcome::Completed => {
                let _ = self.tx.send(Delivery::End);
                tracing::info!(offset = self.offset, outcome = ?outcome, "Log session finished");
            }
            SessionOutcome::ConsumerGone => {
                tracing::debug!(offset = self.offset, "Log consumer went away");
            }
            SessionOutcome::Failed(e) => {
                let _ = self.tx.send(Delivery::Failed(e.clone()));
                if *e == LogError::Cancelled {
                    tracing::info!(offset = self.offset, "Log session cancelled");
                } else {
                    tracing::error!(offset = self.offset, error = %e, "Log session failed");
                }
            }
        }

        outcome
    }

    async fn drive(&mut self) -> Result<SessionOutcome, LogError> {
        let completion = &self.config.completion;
        let mut checks = Backoff::new(completion.initial(), completion.max(), completion.multiplier);
        let mut next_check = Instant::now() + checks.advance();
        let mut phase = Phase::Running;
        let limit = self.config.chunk_limit.max(1);

        loop {
            let chunk = self.fetch_with_retry(limit).await?;
            let fetched = chunk.len();
            self.offset += fetched as u64;
            tracing::trace!(offset = self.offset, bytes = fetched, "Fetched log chunk");

            let payload = self.framer.process(&chunk);
            if !self.deliver(payload) {
                return Ok(SessionOutcome::ConsumerGone);
            }

            // The END marker is authoritative: no check, no further fetch.
            if self.framer.finished() {
                return Ok(SessionOutcome::EndMarker);
            }

            if phase == Phase::Draining {
                if fetched > 0 {
                    continue;
                }
                // Caught up with no frame seen: the held-back bytes are the log.
                let tail = self.framer.finish();
                if !self.deliver(tail) {
                    return Ok(SessionOutcome::ConsumerGone);
                }
                return Ok(SessionOutcome::Completed);
            }

            if Instant::now() >= next_check {
                if self.check_completion().await? {
                    tracing::debug!(offset = self.offset, "Job finished, draining log");
                    phase = Phase::Draining;
                    continue;
                }
                let delay = checks.advance();
                tracing::trace!(next_check_ms = delay.as_millis(), "Job still running");
                next_check = Instant::now() + delay;
            }

            // A full chunk means more is likely waiting.
            if fetched < limit {
                self.wait(self.config.fetch_interval()).await?;
            }
        }
    }

    /// Hand payload to the consumer. Returns `false` once the consumer is gone.
    fn deliver(&self, payload: Vec<u8>) -> bool {
        payload.is_empty() || self.tx.send(Delivery::Data(payload)).is_ok()
    }

    /// Fetch the chunk at the current offset, retrying transient failures.
    async fn fetch_with_retry(&self, limit: usize) -> Result<Vec<u8>, LogError> {
        let retry = &self.config.retry;
        let mut backoff = Backoff::new(retry.initial_delay(), retry.max_delay(), retry.multiplier);
        let mut attempt: u32 = 0;

        loop {
            let result = self
                .cancellable(self.source.fetch(self.offset, limit))
                .await?;

            match result {
                Ok(chunk) => {
                    if attempt > 0 {
                        tracing::info!(attempts = attempt + 1, "Log fetch succeeded after retry");
                    }
                    return Ok(chunk);
                }
                Err(e) if e.is_transient() && attempt < retry.max_retries => {
                    attempt += 1;
                    let delay = backoff.advance();
                    tracing::warn!(
                        error = %e,
                        attempt,
                        max_retries = retry.max_retries,
                        delay_ms = delay.as_millis(),
                        "Log fetch failed, retrying"
                    );
                    self.wait(delay).await?;
                }
                Err(e) => return Err(Self::fetch_failure(e, attempt)),
            }
        }
    }

    fn fetch_failure(e: FetchError, retries: u32) -> LogError {
        if e.is_transient() {
            LogError::RetriesExhausted {
                attempts: retries + 1,
                last: e,
            }
        } else {
            LogError::Fetch(e)
        }
    }

    async fn check_completion(&self) -> Result<bool, LogError> {
        let done = self.cancellable(self.oracle.check()).await??;
        Ok(done)
    }

    async fn wait(&self, delay: std::time::Duration) -> Result<(), LogError> {
        self.cancellable(tokio::time::sleep(delay)).await
    }

    async fn cancellable<F: Future>(&self, fut: F) -> Result<F::Output, LogError> {
        tokio::select! {
            biased;

            () = self.cancel.cancelled() => Err(LogError::Cancelled),
            out = fut => Ok(out),
        }
    }
}
