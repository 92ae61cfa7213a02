//! Scripted log sources and oracles.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use runlog::config::{CompletionConfig, ReaderConfig, RetryConfig};
use runlog::logstream::{oracle_fn, CompletionOracle, FetchError, LogSource, OracleError};
use tokio::time::Instant;

/// What the source does on a given fetch.
#[derive(Debug, Clone)]
pub enum Step {
    Bytes(Vec<u8>),
    Fail(FetchError),
    Hang,
}

#[derive(Debug, Default)]
struct SourceState {
    script: HashMap<usize, Step>,
    fetches: usize,
    offsets: Vec<u64>,
    times: Vec<Instant>,
}

/// Log source answering from a script keyed by fetch number (1-based).
/// Unscripted fetches return an empty chunk.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    state: Arc<Mutex<SourceState>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on(self, fetch: usize, bytes: &[u8]) -> Self {
        self.step(fetch, Step::Bytes(bytes.to_vec()))
    }

    pub fn fail(self, fetch: usize, err: FetchError) -> Self {
        self.step(fetch, Step::Fail(err))
    }

    pub fn hang(self, fetch: usize) -> Self {
        self.step(fetch, Step::Hang)
    }

    fn step(self, fetch: usize, step: Step) -> Self {
        self.state.lock().unwrap().script.insert(fetch, step);
        self
    }

    pub fn fetches(&self) -> usize {
        self.state.lock().unwrap().fetches
    }

    pub fn offsets(&self) -> Vec<u64> {
        self.state.lock().unwrap().offsets.clone()
    }

    pub fn times(&self) -> Vec<Instant> {
        self.state.lock().unwrap().times.clone()
    }
}

#[async_trait]
impl LogSource for ScriptedSource {
    async fn fetch(&self, offset: u64, _limit: usize) -> Result<Vec<u8>, FetchError> {
        let step = {
            let mut state = self.state.lock().unwrap();
            state.fetches += 1;
            state.offsets.push(offset);
            state.times.push(Instant::now());
            let n = state.fetches;
            state.script.get(&n).cloned()
        };

        match step {
            None => Ok(Vec::new()),
            Some(Step::Bytes(bytes)) => Ok(bytes),
            Some(Step::Fail(err)) => Err(err),
            Some(Step::Hang) => std::future::pending().await,
        }
    }
}

/// Oracle reporting done once `source` has served `after` fetches.
/// Every call is counted in `checks`.
pub fn done_after(
    source: &ScriptedSource,
    after: usize,
    checks: &Arc<AtomicUsize>,
) -> impl CompletionOracle + 'static {
    let source = source.clone();
    let checks = Arc::clone(checks);
    oracle_fn(move || {
        checks.fetch_add(1, Ordering::SeqCst);
        let done = source.fetches() >= after;
        async move { Ok::<_, OracleError>(done) }
    })
}

/// Oracle that always answers `answer`, counting calls.
pub fn constant(answer: bool, checks: &Arc<AtomicUsize>) -> impl CompletionOracle + 'static {
    let checks = Arc::clone(checks);
    oracle_fn(move || {
        checks.fetch_add(1, Ordering::SeqCst);
        async move { Ok::<_, OracleError>(answer) }
    })
}

/// Reader configuration used with paused time.
///
/// Fetches every 100ms. Checks happen at 100ms, 300ms, 700ms and then
/// every 400ms, i.e. on fetches 2, 4, 8, 12, 16, ...
pub fn test_config() -> ReaderConfig {
    ReaderConfig {
        fetch_interval_ms: 100,
        chunk_limit: 1024,
        completion: CompletionConfig {
            initial_ms: 100,
            max_ms: 400,
            multiplier: 2.0,
        },
        retry: RetryConfig {
            max_retries: 3,
            initial_delay_ms: 10,
            max_delay_ms: 40,
            multiplier: 2.0,
        },
        ..ReaderConfig::default()
    }
}
