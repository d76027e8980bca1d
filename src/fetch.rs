//! Page and asset retrieval.
//!
//! The pipeline only sees the [`Fetcher`] trait; [`HttpFetcher`] is the
//! `reqwest` implementation used by the binary. Tests substitute an
//! in-memory fetcher.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use reqwest::Client;
use url::Url;

use crate::error::{Error, Result};

/// A successful response body.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// URL after redirects.
    pub final_url: Url,
    pub bytes: Vec<u8>,
    /// Raw `Content-Type` header, if the server sent one.
    pub content_type: Option<String>,
}

/// Retrieves bytes for a URL.
///
/// Non-2xx statuses and timeouts are [`Error::Fetch`].
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn fetch(&self, url: &Url, timeout: Duration, user_agent: &str) -> Result<FetchedPage>;
}

/// `reqwest`-backed fetcher. Cheap to clone; clones share one connection
/// pool.
#[derive(Debug, Clone, Default)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a preconfigured client (proxy, custom TLS roots).
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &Url, timeout: Duration, user_agent: &str) -> Result<FetchedPage> {
        let fail = |reason: String| Error::Fetch {
            url: url.to_string(),
            reason,
        };

        tracing::debug!(%url, ?timeout, "GET");
        let response = self
            .client
            .get(url.clone())
            .header(USER_AGENT, user_agent)
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| fail(describe(&e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(fail(format!("HTTP {status}")));
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| fail(describe(&e)))?.to_vec();

        tracing::debug!(%final_url, bytes = bytes.len(), content_type = ?content_type, "fetched");
        Ok(FetchedPage {
            final_url,
            bytes,
            content_type,
        })
    }
}

fn describe(err: &reqwest::Error) -> String {
    if err.is_timeout() {
        "timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {err}")
    } else {
        err.to_string()
    }
}
