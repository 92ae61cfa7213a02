//! runlog - Stream framed remote run logs as a plain byte stream.

pub mod config;
pub mod display;
pub mod logstream;
pub mod transport;
