//! Configuration types.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::logstream::FramingMode;

/// API client configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Address of the API host.
    pub address: String,
    /// Path prefix of the API on that host.
    pub base_path: String,
    /// API token. Takes precedence over `token_env`.
    pub token: Option<String>,
    /// Environment variable holding the API token.
    pub token_env: String,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            address: "https://app.terraform.io".to_string(),
            base_path: "/api/v2/".to_string(),
            token: None,
            token_env: "TFE_TOKEN".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

/// Schedule of completion checks.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionConfig {
    /// Delay before the first check.
    pub initial_ms: u64,
    /// Upper bound of the delay between checks.
    pub max_ms: u64,
    /// Growth factor applied after each negative check.
    pub multiplier: f64,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            initial_ms: 1000,
            max_ms: 10_000,
            multiplier: 2.0,
        }
    }
}

impl CompletionConfig {
    #[must_use]
    pub fn initial(&self) -> Duration {
        Duration::from_millis(self.initial_ms)
    }

    #[must_use]
    pub fn max(&self) -> Duration {
        Duration::from_millis(self.max_ms)
    }
}

/// Retry policy for transient fetch failures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetryConfig {
    /// Retries after the first failed attempt.
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
    pub multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_delay_ms: 500,
            max_delay_ms: 8000,
            multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }

    #[must_use]
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}

/// Log reader configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReaderConfig {
    /// Wait between two log fetches.
    pub fetch_interval_ms: u64,
    /// Maximum bytes requested per fetch.
    pub chunk_limit: usize,
    pub framing: FramingMode,
    pub completion: CompletionConfig,
    pub retry: RetryConfig,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            fetch_interval_ms: 500,
            chunk_limit: 64 * 1024,
            framing: FramingMode::Auto,
            completion: CompletionConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl ReaderConfig {
    #[must_use]
    pub fn fetch_interval(&self) -> Duration {
        Duration::from_millis(self.fetch_interval_ms)
    }
}

/// Statuses that mark a plan or apply as finished.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub terminal: Vec<String>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            terminal: ["canceled", "errored", "finished", "unreachable", "force_canceled"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub client: ClientConfig,
    pub reader: ReaderConfig,
    pub status: StatusConfig,
}
