//! HTTP fetch boundary.
//!
//! The pipeline never talks to `reqwest` directly; it goes through the
//! [`Fetch`] trait so that watch and embed pages can be served from
//! fixtures in tests. [`HttpFetcher`] is the production implementation.

use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

/// Asynchronous HTTP GET abstraction consumed by the resolution pipeline.
///
/// Network, TLS and non-2xx failures surface as errors; the caller decides
/// whether a failed page is fatal or just one unavailable embed.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// Fetch a URL and return the body as text.
    async fn get_text(&self, url: &str) -> Result<String>;

    /// Fetch a URL and parse the body as JSON.
    async fn get_json(&self, url: &str) -> Result<serde_json::Value>;
}

/// `reqwest`-backed fetcher used outside of tests.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("mzone-dl/", env!("CARGO_PKG_VERSION")))
            // Keep connections alive for reuse across embed fetches
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .tcp_nodelay(true)
            .use_rustls_tls()
            // Compression (auto-negotiated via Accept-Encoding)
            .brotli(true)
            .gzip(true)
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            // Some embed hosts gate playback behind session cookies
            .cookie_store(true)
            .build()?;

        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response> {
        debug!(%url, "fetching");
        let response = self.client.get(url).send().await?;

        let status = response.status();
        debug!(%url, %status, "response received");
        if !status.is_success() {
            return Err(anyhow!("HTTP error {status} for {url}"));
        }

        Ok(response)
    }
}

#[async_trait]
impl Fetch for HttpFetcher {
    async fn get_text(&self, url: &str) -> Result<String> {
        let text = self.get(url).await?.text().await?;
        Ok(text)
    }

    async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        let value = self.get(url).await?.json().await?;
        Ok(value)
    }
}
