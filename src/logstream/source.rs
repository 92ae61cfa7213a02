//! Remote log sources.

use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use super::error::FetchError;

/// Where raw log bytes come from.
///
/// A fetch returns the bytes available at `offset`, at most `limit` of them.
/// An empty chunk means nothing new has been appended yet.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn fetch(&self, offset: u64, limit: usize) -> Result<Vec<u8>, FetchError>;
}

/// Fetches chunks of a log over HTTP with `limit`/`offset` query parameters.
#[derive(Debug, Clone)]
pub struct HttpLogSource {
    client: Client,
    url: Url,
}

impl HttpLogSource {
    #[must_use]
    pub fn new(client: Client, url: Url) -> Self {
        Self { client, url }
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Log URL for one fetch. Existing query pairs other than `limit` and
    /// `offset` are kept.
    #[must_use]
    pub fn chunk_url(&self, offset: u64, limit: usize) -> Url {
        let kept: Vec<(String, String)> = self
            .url
            .query_pairs()
            .filter(|(k, _)| k != "limit" && k != "offset")
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        let mut url = self.url.clone();
        url.query_pairs_mut()
            .clear()
            .extend_pairs(kept)
            .append_pair("limit", &limit.to_string())
            .append_pair("offset", &offset.to_string());
        url
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn fetch(&self, offset: u64, limit: usize) -> Result<Vec<u8>, FetchError> {
        let url = self.chunk_url(offset, limit);
        tracing::trace!(%url, "Fetching log chunk");

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        Ok(bytes.to_vec())
    }
}
