//! Log stream tests.

mod fakes;
mod stream_test;

/// Verify all public log stream types are exported from the library.
#[test]
fn test_all_logstream_types_exported() {
    use runlog::logstream::{
        oracle_fn, Backoff, CompletionOracle, FetchError, FnOracle, FramerState, FramingMode,
        HttpLogSource, LogError, LogReader, LogSource, LogStream, MarkerFramer, NeverDone,
        OracleError, SessionOutcome, StatusOracle, StreamStatus, END_MARKER, START_MARKER,
    };

    let _ = std::any::type_name::<Backoff>();
    let _ = std::any::type_name::<FetchError>();
    let _ = std::any::type_name::<FramerState>();
    let _ = std::any::type_name::<HttpLogSource>();
    let _ = std::any::type_name::<LogError>();
    let _ = std::any::type_name::<LogReader<HttpLogSource, NeverDone>>();
    let _ = std::any::type_name::<LogStream>();
    let _ = std::any::type_name::<OracleError>();
    let _ = std::any::type_name::<SessionOutcome>();
    let _ = std::any::type_name::<StatusOracle>();
    let _ = std::any::type_name::<StreamStatus>();
    let _ = std::any::type_name::<Box<dyn CompletionOracle>>();
    let _ = std::any::type_name::<Box<dyn LogSource>>();

    let oracle: FnOracle<_> = oracle_fn(|| async { Ok::<_, OracleError>(true) });
    let _ = oracle;

    assert_eq!(START_MARKER, 0x02);
    assert_eq!(END_MARKER, 0x03);
    assert_eq!(MarkerFramer::new(FramingMode::default()).state(), FramerState::SeekingStart);
}
