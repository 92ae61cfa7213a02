//! Consumer-side reads over a live poll loop.

use std::io::Read;
use std::time::Duration;

use runlog::config::ReaderConfig;
use runlog::logstream::{LogError, LogReader, NeverDone, SessionOutcome, StreamStatus};

use super::fakes::{test_config, ScriptedSource};

fn fast_config() -> ReaderConfig {
    ReaderConfig {
        fetch_interval_ms: 5,
        ..test_config()
    }
}

#[test]
fn blocking_read_from_plain_thread() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    let source = ScriptedSource::new()
        .on(1, b"\x02Hello")
        .on(3, b" World")
        .on(4, b"\x03");
    let mut stream = LogReader::new(source.clone(), NeverDone)
        .with_config(fast_config())
        .open_on(runtime.handle().clone());

    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    assert_eq!(out, "Hello World");
    assert_eq!(stream.status(), &StreamStatus::Ended);
    assert_eq!(source.fetches(), 4);

    let mut buf = [0u8; 4];
    assert_eq!(stream.read(&mut buf).unwrap(), 0);
}

#[test]
fn blocking_read_surfaces_terminal_error() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    let source = ScriptedSource::new().on(1, b"\x02partial").fail(
        2,
        runlog::logstream::FetchError::Fatal("gone".to_string()),
    );
    let mut stream = LogReader::new(source, NeverDone)
        .with_config(fast_config())
        .open_on(runtime.handle().clone());

    let mut buf = [0u8; 64];
    let n = stream.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], b"partial");

    let err = stream.read(&mut buf).unwrap_err();
    let inner = err
        .get_ref()
        .and_then(|e| e.downcast_ref::<LogError>())
        .cloned();
    assert!(matches!(inner, Some(LogError::Fetch(_))));

    // Sticky.
    assert!(stream.read(&mut buf).is_err());
}

#[tokio::test(start_paused = true)]
async fn async_copy_into_writer() {
    let source = ScriptedSource::new()
        .on(1, b"\x02line one\n")
        .on(2, b"line two\n")
        .on(5, b"line three\n\x03");
    let mut stream = LogReader::new(source, NeverDone)
        .with_config(test_config())
        .open();

    let mut sink: Vec<u8> = Vec::new();
    let copied = tokio::io::copy(&mut stream, &mut sink).await.unwrap();
    assert_eq!(copied, 29);
    assert_eq!(sink, b"line one\nline two\nline three\n");
    assert_eq!(stream.close().await, Some(SessionOutcome::EndMarker));
}

#[tokio::test(start_paused = true)]
async fn close_before_first_read() {
    let source = ScriptedSource::new().on(1, b"\x02never read\x03");
    let stream = LogReader::new(source.clone(), NeverDone)
        .with_config(test_config())
        .open();

    assert_eq!(stream.close().await, None);
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.fetches(), 0);
}

#[tokio::test(start_paused = true)]
async fn close_stops_running_session() {
    let source = ScriptedSource::new().on(1, b"\x02first");
    let mut stream = LogReader::new(source.clone(), NeverDone)
        .with_config(test_config())
        .open();

    assert_eq!(stream.next_chunk().await, Ok(Some(b"first".to_vec())));
    assert_eq!(
        stream.close().await,
        Some(SessionOutcome::Failed(LogError::Cancelled))
    );

    let fetches = source.fetches();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(source.fetches(), fetches);
}

#[tokio::test(start_paused = true)]
async fn debug_shows_status() {
    let stream = LogReader::new(ScriptedSource::new(), NeverDone).open();
    let rendered = format!("{stream:?}");
    assert!(rendered.contains("LogStream"));
    assert!(rendered.contains("Open"));
}
