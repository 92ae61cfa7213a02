//! Entry point for reading a remote log.

use futures_util::FutureExt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use super::oracle::CompletionOracle;
use super::poll::PollLoop;
use super::source::LogSource;
use super::stream::LogStream;
use crate::config::ReaderConfig;

/// Configures and opens a streaming read of one remote log.
///
/// ```no_run
/// use runlog::logstream::{oracle_fn, HttpLogSource, LogReader, OracleError};
/// use tokio::io::AsyncReadExt;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let url = url::Url::parse("https://archivist.example.com/v1/object/abc")?;
/// let source = HttpLogSource::new(reqwest::Client::new(), url);
/// let oracle = oracle_fn(|| async { Ok::<_, OracleError>(false) });
///
/// let mut stream = LogReader::new(source, oracle).open();
/// let mut logs = String::new();
/// stream.read_to_string(&mut logs).await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct LogReader<S, O> {
    source: S,
    oracle: O,
    config: ReaderConfig,
    cancel: CancellationToken,
}

impl<S, O> LogReader<S, O>
where
    S: LogSource + 'static,
    O: CompletionOracle + 'static,
{
    #[must_use]
    pub fn new(source: S, oracle: O) -> Self {
        Self {
            source,
            oracle,
            config: ReaderConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: ReaderConfig) -> Self {
        self.config = config;
        self
    }

    /// Tie the session to a caller-owned cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    #[must_use]
    pub fn config(&self) -> &ReaderConfig {
        &self.config
    }

    /// Open the stream on the current tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside of a tokio runtime.
    #[must_use]
    pub fn open(self) -> LogStream {
        self.open_on(Handle::current())
    }

    /// Open the stream, spawning its poll loop on `handle` at the first read.
    #[must_use]
    pub fn open_on(self, handle: Handle) -> LogStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let session = self.cancel.child_token();
        let poll_loop = PollLoop::new(self.source, self.oracle, self.config, tx, session.clone());
        let span = tracing::info_span!("log_session");
        let future = poll_loop.run().instrument(span).boxed();
        LogStream::new(rx, future, handle, session.drop_guard())
    }
}
