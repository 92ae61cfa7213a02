//! Authenticated API client.

use std::collections::HashSet;
use std::time::Duration;

use reqwest::{Method, Response};
use url::Url;

use crate::config::{ClientConfig, ReaderConfig, StatusConfig};
use crate::logstream::{HttpLogSource, LogReader, StatusOracle};

use super::TransportError;

/// Media type of JSON:API documents.
pub const JSONAPI_MEDIA_TYPE: &str = "application/vnd.api+json";

/// User agent sent with every request.
const USER_AGENT: &str = concat!("runlog/", env!("CARGO_PKG_VERSION"));

/// Build an HTTP client with proper timeout configuration.
///
/// # Errors
///
/// Returns `TransportError::Build` if the TLS backend cannot be initialized.
pub fn build_http_client(config: &ClientConfig) -> Result<reqwest::Client, TransportError> {
    reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| TransportError::Build(e.to_string()))
}

/// Issues authenticated requests against the API.
///
/// Does not retry; callers that poll own their retry policy.
#[derive(Debug, Clone)]
pub struct Client {
    http: reqwest::Client,
    base_url: Url,
    token: String,
}

impl Client {
    /// Create a client from configuration.
    ///
    /// The token comes from `config.token`, or else from the environment
    /// variable named by `config.token_env`.
    ///
    /// # Errors
    ///
    /// Returns an error if no token is available, the address is not a valid
    /// URL, or the HTTP client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let token = config
            .token
            .clone()
            .or_else(|| std::env::var(&config.token_env).ok())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| TransportError::MissingToken(config.token_env.clone()))?;

        let base_url = Self::base_url(&config.address, &config.base_path)?;
        let http = build_http_client(config)?;

        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    fn base_url(address: &str, base_path: &str) -> Result<Url, TransportError> {
        let joined = format!(
            "{}/{}/",
            address.trim_end_matches('/'),
            base_path.trim_matches('/')
        );
        Url::parse(&joined).map_err(|e| TransportError::InvalidUrl {
            url: joined,
            reason: e.to_string(),
        })
    }

    /// The underlying HTTP client, for requests that carry no API token.
    #[must_use]
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    #[must_use]
    pub fn base(&self) -> &Url {
        &self.base_url
    }

    /// Resolve an API path against the base URL.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::InvalidUrl` if the path cannot be joined.
    pub fn url_for(&self, path: &str) -> Result<Url, TransportError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| TransportError::InvalidUrl {
                url: path.to_string(),
                reason: e.to_string(),
            })
    }

    /// Issue an authenticated request.
    ///
    /// # Errors
    ///
    /// Returns an error if the request cannot be sent or the server answers
    /// with a non-success status.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<Response, TransportError> {
        let url = self.url_for(path)?;
        tracing::debug!(%method, %url, "API request");

        let mut request = self
            .http
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, JSONAPI_MEDIA_TYPE);
        if let Some(body) = body {
            request = request
                .header(reqwest::header::CONTENT_TYPE, JSONAPI_MEDIA_TYPE)
                .body(body.to_string());
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                TransportError::Timeout
            } else {
                TransportError::Request(e.to_string())
            }
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        Err(TransportError::Status {
            status: status.as_u16(),
            body: text,
        })
    }

    /// GET a path and decode the JSON body.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body is not JSON.
    pub async fn get_json(&self, path: &str) -> Result<serde_json::Value, TransportError> {
        let response = self.request(Method::GET, path, None).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| TransportError::Parse(e.to_string()))
    }

    /// Build a log reader for a resource that exposes a `log-read-url`
    /// attribute, such as `plans/<id>` or `applies/<id>`.
    ///
    /// The reader stops when the log's END marker arrives, or when the
    /// resource reaches one of the terminal statuses.
    ///
    /// # Errors
    ///
    /// Returns an error if the resource cannot be read or has no log URL.
    pub async fn resource_logs(
        &self,
        path: &str,
        reader: &ReaderConfig,
        status: &StatusConfig,
    ) -> Result<LogReader<HttpLogSource, StatusOracle>, TransportError> {
        let document = self.get_json(path).await?;
        let raw = document["data"]["attributes"]["log-read-url"]
            .as_str()
            .ok_or_else(|| TransportError::Parse(format!("{path} has no log-read-url")))?;
        let log_url = Url::parse(raw).map_err(|e| TransportError::InvalidUrl {
            url: raw.to_string(),
            reason: e.to_string(),
        })?;

        tracing::info!(%path, "Resolved log URL");
        let terminal: HashSet<String> = status.terminal.iter().cloned().collect();
        let source = HttpLogSource::new(self.http.clone(), log_url);
        let oracle = StatusOracle::new(self.clone(), path, terminal);
        Ok(LogReader::new(source, oracle).with_config(reader.clone()))
    }
}
