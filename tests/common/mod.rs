//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use rs_blog2md::{Error, FetchedPage, Fetcher, MemoryWriter, Options, Pipeline, Result};
use url::Url;

/// In-memory web: URL -> (body, content type). Everything else is a 404.
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, (Vec<u8>, Option<String>)>,
    requests: Mutex<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn html(self, url: &str, body: &str) -> Self {
        self.serve(url, body.as_bytes(), Some("text/html; charset=utf-8"))
    }

    pub fn serve(mut self, url: &str, bytes: &[u8], content_type: Option<&str>) -> Self {
        self.pages
            .insert(url.to_string(), (bytes.to_vec(), content_type.map(str::to_string)));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Fetcher for FakeSite {
    async fn fetch(&self, url: &Url, _timeout: Duration, _user_agent: &str) -> Result<FetchedPage> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        let (bytes, content_type) = self.pages.get(url.as_str()).cloned().ok_or_else(|| Error::Fetch {
            url: url.to_string(),
            reason: "HTTP 404 Not Found".into(),
        })?;
        Ok(FetchedPage {
            final_url: url.clone(),
            bytes,
            content_type,
        })
    }
}

/// Options with retries kept fast.
pub fn quick_options() -> Options {
    Options {
        asset_retries: 1,
        asset_retry_backoff_ms: 1,
        ..Options::default()
    }
}

pub fn pipeline(site: &Arc<FakeSite>, writer: &Arc<MemoryWriter>) -> Pipeline {
    Pipeline::new(
        Arc::clone(site) as Arc<dyn Fetcher>,
        Arc::clone(writer) as Arc<dyn rs_blog2md::Writer>,
        quick_options(),
    )
}

/// `n` paragraphs of plausible article prose.
pub fn prose(n: usize) -> String {
    (0..n)
        .map(|i| {
            format!(
                "<p>Paragraph {i}: the borrow checker enforces that references never outlive \
                 the data they point to, which rules out dangling pointers at compile time.</p>"
            )
        })
        .collect()
}

pub fn text(writer: &MemoryWriter, path: &str) -> String {
    match writer.get(path) {
        Some(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
        None => panic!("nothing written to {path}; have {:?}", writer.paths()),
    }
}
