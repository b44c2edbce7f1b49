//! Shared HTTP client for every remote fetch.
//!
//! Wraps a single `reqwest::Client` so the ISO table, boundary service,
//! geometry downloads and basemap tiles share one connection pool and one
//! user agent.

use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Default user agent. Tile servers reject anonymous clients.
pub const DEFAULT_USER_AGENT: &str = concat!("geothumb/", env!("CARGO_PKG_VERSION"));

/// Errors raised by a single GET.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

/// Thin GET-only client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    /// Build a client. `timeout` of `None` leaves reqwest's defaults in place.
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let inner = builder.build().map_err(|source| FetchError::Transport {
            url: String::new(),
            source,
        })?;
        Ok(Self { inner })
    }

    /// GET `url` and return the body bytes. Non-2xx statuses are errors.
    pub async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.send(url).await?;
        let bytes = resp.bytes().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })?;
        Ok(bytes.to_vec())
    }

    /// GET `url` and return the body as UTF-8 text.
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.send(url).await?;
        resp.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }

    /// GET `url` and parse the body as JSON.
    pub async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let text = self.get_text(url).await?;
        serde_json::from_str(&text).map_err(|e| FetchError::Decode {
            url: url.to_string(),
            message: e.to_string(),
        })
    }

    async fn send(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        debug!("GET {url}");
        let resp = self
            .inner
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(resp)
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self {
            inner: reqwest::Client::builder()
                .user_agent(DEFAULT_USER_AGENT)
                .build()
                .unwrap_or_default(),
        }
    }
}
