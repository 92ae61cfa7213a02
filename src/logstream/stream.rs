//! Consumer side of a log session.
//!
//! The poll loop pushes payload into an unbounded FIFO; [`LogStream`] drains
//! it through `std::io::Read`, `tokio::io::AsyncRead` or [`LogStream::next_chunk`].

use std::io;
use std::pin::Pin;
use std::task::{ready, Context, Poll};

use futures_util::future::BoxFuture;
use tokio::io::{AsyncRead, ReadBuf};
use tokio::runtime::Handle;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::task::JoinHandle;
use tokio_util::sync::DropGuard;

use super::error::LogError;
use super::poll::SessionOutcome;

/// One message from the poll loop to the consumer.
#[derive(Debug)]
pub(crate) enum Delivery {
    Data(Vec<u8>),
    End,
    Failed(LogError),
}

/// Where the consumer side stands once the buffered payload is drained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamStatus {
    Open,
    Ended,
    Failed(LogError),
}

/// A remote log exposed as a sequential byte stream.
///
/// The poll loop is spawned on the first read. Reads return payload in log
/// order, then end-of-stream, or the session's terminal error. Both terminal
/// results are repeated on every later read. Dropping the stream stops the
/// poll loop.
pub struct LogStream {
    rx: UnboundedReceiver<Delivery>,
    pending: Vec<u8>,
    pos: usize,
    status: StreamStatus,
    starter: Option<(BoxFuture<'static, SessionOutcome>, Handle)>,
    task: Option<JoinHandle<SessionOutcome>>,
    guard: Option<DropGuard>,
}

impl std::fmt::Debug for LogStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStream")
            .field("buffered", &(self.pending.len() - self.pos))
            .field("status", &self.status)
            .field("started", &self.starter.is_none())
            .finish_non_exhaustive()
    }
}

impl LogStream {
    pub(crate) fn new(
        rx: UnboundedReceiver<Delivery>,
        poll_loop: BoxFuture<'static, SessionOutcome>,
        handle: Handle,
        guard: DropGuard,
    ) -> Self {
        Self {
            rx,
            pending: Vec::new(),
            pos: 0,
            status: StreamStatus::Open,
            starter: Some((poll_loop, handle)),
            task: None,
            guard: Some(guard),
        }
    }

    /// Status after the buffered payload; `Open` while the session runs.
    #[must_use]
    pub fn status(&self) -> &StreamStatus {
        &self.status
    }

    /// Receive the next payload chunk.
    ///
    /// Returns `Ok(None)` at end-of-stream.
    ///
    /// # Errors
    ///
    /// Returns the session's terminal error once all payload delivered
    /// before it has been returned.
    pub async fn next_chunk(&mut self) -> Result<Option<Vec<u8>>, LogError> {
        self.start();
        loop {
            if self.pos < self.pending.len() {
                let mut chunk = std::mem::take(&mut self.pending);
                chunk.drain(..self.pos);
                self.pos = 0;
                return Ok(Some(chunk));
            }
            match &self.status {
                StreamStatus::Ended => return Ok(None),
                StreamStatus::Failed(e) => return Err(e.clone()),
                StreamStatus::Open => {}
            }
            let delivery = self.rx.recv().await;
            self.accept(delivery);
        }
    }

    /// Turn the stream into a `Stream` of payload chunks.
    ///
    /// A terminal error is yielded once, then the stream ends.
    pub fn into_chunks(self) -> impl futures_core::Stream<Item = Result<Vec<u8>, LogError>> {
        futures_util::stream::unfold(Some(self), |state| async move {
            let mut stream = state?;
            match stream.next_chunk().await {
                Ok(Some(chunk)) => Some((Ok(chunk), Some(stream))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Stop the session and wait for the poll loop to exit.
    ///
    /// Returns `None` if the loop was never started.
    pub async fn close(mut self) -> Option<SessionOutcome> {
        if let Some(guard) = self.guard.take() {
            guard.disarm().cancel();
        }
        let task = self.task.take()?;
        task.await.ok()
    }

    fn start(&mut self) {
        if let Some((poll_loop, handle)) = self.starter.take() {
            tracing::debug!("Spawning log poll loop");
            self.task = Some(handle.spawn(poll_loop));
        }
    }

    fn accept(&mut self, delivery: Option<Delivery>) {
        match delivery {
            Some(Delivery::Data(bytes)) => {
                self.pending = bytes;
                self.pos = 0;
            }
            Some(Delivery::End) => self.status = StreamStatus::Ended,
            Some(Delivery::Failed(e)) => self.status = StreamStatus::Failed(e),
            None => {
                if self.status == StreamStatus::Open {
                    self.status = StreamStatus::Failed(LogError::Aborted);
                }
            }
        }
    }

    /// Answer a read without waiting, if possible.
    fn ready(&mut self, buf: &mut [u8]) -> Option<Result<usize, LogError>> {
        if self.pos < self.pending.len() {
            let n = buf.len().min(self.pending.len() - self.pos);
            buf[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
            self.pos += n;
            return Some(Ok(n));
        }
        match &self.status {
            StreamStatus::Open => None,
            StreamStatus::Ended => Some(Ok(0)),
            StreamStatus::Failed(e) => Some(Err(e.clone())),
        }
    }
}

/// Blocking reads.
///
/// # Panics
///
/// Panics when called from within an asynchronous execution context; use the
/// `AsyncRead` impl or [`LogStream::next_chunk`] there.
impl io::Read for LogStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        self.start();
        loop {
            if let Some(result) = self.ready(buf) {
                return result.map_err(io::Error::from);
            }
            let delivery = self.rx.blocking_recv();
            self.accept(delivery);
        }
    }
}

impl AsyncRead for LogStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if buf.remaining() == 0 {
            return Poll::Ready(Ok(()));
        }
        this.start();
        loop {
            match this.ready(buf.initialize_unfilled()) {
                Some(Ok(n)) => {
                    buf.advance(n);
                    return Poll::Ready(Ok(()));
                }
                Some(Err(e)) => return Poll::Ready(Err(e.into())),
                None => {}
            }
            let delivery = ready!(this.rx.poll_recv(cx));
            this.accept(delivery);
        }
    }
}
