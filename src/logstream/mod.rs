//! Streaming reader for remote run logs.
//!
//! A poll loop fetches an append-only log in chunks, strips its START/END
//! framing and hands the payload to a [`LogStream`]. Logs without an END
//! marker are terminated by a [`CompletionOracle`].

mod error;
mod framer;
mod oracle;
mod poll;
mod reader;
mod retry;
mod source;
mod stream;

pub use error::{FetchError, LogError, OracleError};
pub use framer::{FramerState, FramingMode, MarkerFramer, END_MARKER, START_MARKER};
pub use oracle::{oracle_fn, CompletionOracle, FnOracle, NeverDone, StatusOracle};
pub use poll::SessionOutcome;
pub use reader::LogReader;
pub use retry::Backoff;
pub use source::{HttpLogSource, LogSource};
pub use stream::{LogStream, StreamStatus};
