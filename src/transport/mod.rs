//! HTTP transport for the run API.

mod client;
mod error;

pub use client::{build_http_client, Client, JSONAPI_MEDIA_TYPE};
pub use error::TransportError;
