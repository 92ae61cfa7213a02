//! Control-byte framing of remote run logs.
//!
//! Remote logs may wrap their content between a single START (`0x02`) and a
//! single END (`0x03`) byte. Everything outside that frame is noise. Logs
//! produced by older backends carry no markers at all; their bytes are only
//! released once the job is known to be complete and no frame can follow.

use serde::{Deserialize, Serialize};

/// Start-of-text marker.
pub const START_MARKER: u8 = 0x02;

/// End-of-text marker.
pub const END_MARKER: u8 = 0x03;

/// How the framer treats bytes seen before any START marker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FramingMode {
    /// Hold bytes back until START arrives (and drop them) or the job
    /// completes without a frame (and release them as the log).
    #[default]
    Auto,
    /// Always wait for START, discarding everything before it.
    RequireStart,
    /// Decide on the first non-empty chunk: framed if it holds START,
    /// streamed live otherwise. Later marker bytes are payload.
    PassThrough,
}

/// Scanner state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FramerState {
    /// No START seen yet.
    #[default]
    SeekingStart,
    /// Between START and END.
    InBody,
    /// Unframed log, every byte is payload.
    PassThrough,
    /// END seen, the frame is closed.
    Done,
}

/// Stateful marker scanner turning raw chunks into payload bytes.
#[derive(Debug, Clone, Default)]
pub struct MarkerFramer {
    mode: FramingMode,
    state: FramerState,
    held: Vec<u8>,
}

impl MarkerFramer {
    #[must_use]
    pub fn new(mode: FramingMode) -> Self {
        Self {
            mode,
            state: FramerState::SeekingStart,
            held: Vec::new(),
        }
    }

    #[must_use]
    pub fn state(&self) -> FramerState {
        self.state
    }

    /// Whether the START marker has been observed.
    #[must_use]
    pub fn started(&self) -> bool {
        matches!(self.state, FramerState::InBody | FramerState::Done)
    }

    /// Whether the END marker closed the frame.
    #[must_use]
    pub fn finished(&self) -> bool {
        self.state == FramerState::Done
    }

    /// Number of pre-START bytes held back in `Auto` mode.
    #[must_use]
    pub fn held_back(&self) -> usize {
        self.held.len()
    }

    /// Consume one raw chunk and return the payload it contributes.
    ///
    /// An empty chunk yields nothing and leaves the state untouched.
    pub fn process(&mut self, chunk: &[u8]) -> Vec<u8> {
        if chunk.is_empty() {
            return Vec::new();
        }

        let mut payload = Vec::new();
        let mut rest = chunk;

        loop {
            rest = match self.state {
                FramerState::SeekingStart => self.seek_start(rest, &mut payload),
                FramerState::InBody => self.scan_body(rest, &mut payload),
                FramerState::PassThrough => {
                    payload.extend_from_slice(rest);
                    &[]
                }
                FramerState::Done => &[],
            };
            if rest.is_empty() {
                break;
            }
        }

        payload
    }

    /// Close the framer once the job is complete and no more bytes will come.
    ///
    /// If no START was ever seen in `Auto` mode, the held-back bytes are the
    /// log: they are returned without marker bytes. Otherwise returns nothing.
    pub fn finish(&mut self) -> Vec<u8> {
        let held = std::mem::take(&mut self.held);
        if self.state != FramerState::SeekingStart || held.is_empty() {
            return Vec::new();
        }

        self.transition(FramerState::PassThrough);
        held.into_iter()
            .filter(|&b| b != START_MARKER && b != END_MARKER)
            .collect()
    }

    fn seek_start<'a>(&mut self, bytes: &'a [u8], payload: &mut Vec<u8>) -> &'a [u8] {
        if let Some(i) = bytes.iter().position(|&b| b == START_MARKER) {
            let discarded = i + std::mem::take(&mut self.held).len();
            if discarded > 0 {
                tracing::trace!(discarded, "Dropping bytes before start marker");
            }
            self.transition(FramerState::InBody);
            return &bytes[i + 1..];
        }

        match self.mode {
            FramingMode::Auto => {
                self.held.extend_from_slice(bytes);
                tracing::trace!(held = self.held.len(), "Holding bytes before start marker");
            }
            FramingMode::RequireStart => {
                tracing::trace!(discarded = bytes.len(), "Dropping pre-log noise");
            }
            FramingMode::PassThrough => {
                // First non-empty chunk without START: stream it unframed.
                self.transition(FramerState::PassThrough);
                payload.extend_from_slice(bytes);
            }
        }
        &[]
    }

    fn scan_body<'a>(&mut self, bytes: &'a [u8], payload: &mut Vec<u8>) -> &'a [u8] {
        match bytes.iter().position(|&b| b == END_MARKER) {
            Some(j) => {
                payload.extend_from_slice(&bytes[..j]);
                self.transition(FramerState::Done);
                &[]
            }
            None => {
                payload.extend_from_slice(bytes);
                &[]
            }
        }
    }

    fn transition(&mut self, next: FramerState) {
        tracing::debug!(from = ?self.state, to = ?next, "Framer transition");
        self.state = next;
    }
}
