//! Configuration file loader.

use std::path::{Path, PathBuf};

use url::Url;

use super::Settings;

/// Configuration loader that searches multiple locations.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Search paths in order of priority.
    search_paths: Vec<PathBuf>,
    /// API address taking precedence over any config file.
    address: Option<String>,
}

impl ConfigLoader {
    /// Create a new config loader with default search paths.
    #[must_use]
    pub fn new() -> Self {
        let mut search_paths = Vec::new();

        // 1. Current directory: .runlog.toml
        search_paths.push(PathBuf::from(".runlog.toml"));

        // 2. User config directory: ~/.config/runlog/config.toml
        if let Some(config_dir) = dirs::config_dir() {
            search_paths.push(config_dir.join("runlog").join("config.toml"));
        }

        Self {
            search_paths,
            address: None,
        }
    }

    /// Create a config loader with a specific config file path.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            search_paths: vec![path],
            address: None,
        }
    }

    /// Override the API address from the config file.
    #[must_use]
    pub fn with_address(mut self, address: Option<String>) -> Self {
        self.address = address;
        self
    }

    /// Load configuration from the first available file, or return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be parsed, or if
    /// the resulting API address is not a URL.
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let mut settings = match self.search_paths.iter().find(|p| p.exists()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                Self::load_from_path(path)?
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                Settings::default()
            }
        };

        if let Some(address) = &self.address {
            tracing::debug!(%address, "Using API address override");
            settings.client.address.clone_from(address);
        }

        Url::parse(&settings.client.address).map_err(|e| ConfigError::InvalidAddress {
            address: settings.client.address.clone(),
            reason: e.to_string(),
        })?;

        Ok(settings)
    }

    fn load_from_path(path: &Path) -> Result<Settings, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    #[must_use]
    pub fn search_paths(&self) -> &[PathBuf] {
        &self.search_paths
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid API address {address}: {reason}")]
    InvalidAddress { address: String, reason: String },
}
