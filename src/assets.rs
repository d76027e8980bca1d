//! Asset Localization
//!
//! Downloads every image the cleaned article references and rewrites the
//! references to local copies.
//!
//! DOM documents are not `Send`, so the work runs in three phases:
//! discovery on one parse (plain URLs out), concurrent downloads, then
//! rewriting on a fresh parse once every download has finished.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use url::Url;

use crate::dom::{self, Selection};
use crate::error::{Error, Result};
use crate::fetch::{FetchedPage, Fetcher};
use crate::options::Options;
use crate::url_utils::{self, extension_for_content_type, sanitize_filename, split_extension};
use crate::writer::Writer;

/// Attributes that may carry an image URL, in order of preference.
pub const IMAGE_SOURCE_ATTRS: &[&str] = &["src", "data-src", "data-original", "data-lazy-src"];

const LAZY_ATTRS: &[&str] = &["data-src", "data-original", "data-lazy-src", "srcset", "data-srcset"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AssetStatus {
    /// Discovered but not downloaded (localization disabled).
    Pending,
    Fetched,
    Failed,
}

/// One distinct image referenced by the article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Asset {
    /// Absolute URL without fragment.
    pub remote_url: String,
    /// Path relative to the document directory, e.g. `assets/photo.png`.
    pub local_relative_path: String,
    pub status: AssetStatus,
    pub byte_size: Option<u64>,
}

/// Rewritten HTML plus the assets in first-discovery order.
#[derive(Debug, Clone, Default)]
pub struct Localized {
    pub html: String,
    pub assets: Vec<Asset>,
}

impl Localized {
    #[must_use]
    pub fn fetched(&self) -> usize {
        self.count(AssetStatus::Fetched)
    }

    #[must_use]
    pub fn failed(&self) -> usize {
        self.count(AssetStatus::Failed)
    }

    fn count(&self, status: AssetStatus) -> usize {
        self.assets.iter().filter(|a| a.status == status).count()
    }
}

/// The URL an `<img>` points at, before resolution. `data:` placeholders
/// in `src` defer to the lazy-load attributes.
fn image_reference(img: &Selection) -> Option<(&'static str, String)> {
    IMAGE_SOURCE_ATTRS.iter().find_map(|attr| {
        dom::non_empty_attribute(img, attr)
            .filter(|value| !value.to_ascii_lowercase().starts_with("data:"))
            .map(|value| (*attr, value))
    })
}

/// Distinct image URLs in `html`, first-discovery order.
#[must_use]
pub fn discover(html: &str, base: Option<&Url>) -> Vec<Url> {
    let doc = dom::parse_fragment(html);
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    for img in doc.select("img").iter() {
        let Some((_, reference)) = image_reference(&img) else {
            continue;
        };
        let Some(url) = url_utils::resolve_reference(&reference, base) else {
            continue;
        };
        if seen.insert(url.to_string()) {
            urls.push(url);
        }
    }
    urls
}

/// Assigns unique local file names in discovery order.
#[derive(Debug, Default)]
pub struct AssetNamer {
    used: HashSet<String>,
    unnamed: usize,
}

impl AssetNamer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Name for `url`: its sanitized basename, else `image-N`; an extension
    /// from `content_type` is added when the name has none. Repeats get
    /// `-1`, `-2`, ... before the extension.
    pub fn name(&mut self, url: &Url, content_type: Option<&str>) -> String {
        let basename = url_utils::extract_filename(url);
        let (stem, ext) = split_extension(&basename);
        let mut stem = sanitize_filename(stem);
        let mut ext = ext.map(sanitize_filename).filter(|e| !e.is_empty());

        if stem.is_empty() {
            self.unnamed += 1;
            stem = format!("image-{}", self.unnamed);
        }
        if ext.is_none() {
            ext = content_type.and_then(extension_for_content_type).map(str::to_string);
        }

        let join = |stem: &str| match &ext {
            Some(ext) => format!("{stem}.{ext}"),
            None => stem.to_string(),
        };
        let mut candidate = join(&stem);
        let mut n = 0;
        while !self.used.insert(candidate.to_ascii_lowercase()) {
            n += 1;
            candidate = join(&format!("{stem}-{n}"));
        }
        candidate
    }
}

/// Fetch one asset with bounded retry and linear backoff.
async fn fetch_with_retry(
    fetcher: &dyn Fetcher,
    url: &Url,
    options: &Options,
) -> Result<FetchedPage> {
    let mut attempt = 0;
    loop {
        let outcome = fetcher
            .fetch(url, options.timeout(), &options.user_agent)
            .await
            .and_then(|page| match page.content_type.as_deref() {
                Some(ct) if ct.trim_start().to_ascii_lowercase().starts_with("text/html") => {
                    Err(Error::AssetFetch {
                        url: url.to_string(),
                        reason: format!("unexpected content type {ct}"),
                    })
                }
                _ => Ok(page),
            });

        match outcome {
            Ok(page) => return Ok(page),
            Err(err) if attempt < options.asset_retries => {
                attempt += 1;
                let delay = options.retry_backoff(attempt);
                tracing::debug!(%url, attempt, ?delay, error = %err, "retrying asset");
                tokio::time::sleep(delay).await;
            }
            Err(err) => {
                let reason = match err {
                    Error::Fetch { reason, .. } | Error::AssetFetch { reason, .. } => reason,
                    other => other.to_string(),
                };
                return Err(Error::AssetFetch {
                    url: url.to_string(),
                    reason,
                });
            }
        }
    }
}

/// Downloads and rewrites article images.
#[derive(Clone)]
pub struct AssetLocalizer {
    fetcher: Arc<dyn Fetcher>,
    options: Arc<Options>,
}

impl AssetLocalizer {
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, options: &Options) -> Self {
        Self {
            fetcher,
            options: Arc::new(options.clone()),
        }
    }

    /// Download every distinct image in `html` and rewrite references to
    /// fetched ones. Files are written below `doc_dir` through `writer`.
    ///
    /// Individual failures never fail the call: the asset is marked
    /// [`AssetStatus::Failed`] and keeps its remote reference.
    pub async fn localize(
        &self,
        html: &str,
        base: Option<&Url>,
        writer: &dyn Writer,
        doc_dir: &Path,
    ) -> Localized {
        let urls = discover(html, base);
        if urls.is_empty() {
            return Localized {
                html: html.to_string(),
                assets: Vec::new(),
            };
        }
        let asset_dir = self.options.asset_dir.trim_matches('/');

        if !self.options.localize_assets {
            let mut namer = AssetNamer::new();
            let assets = urls
                .iter()
                .map(|url| Asset {
                    remote_url: url.to_string(),
                    local_relative_path: format!("{asset_dir}/{}", namer.name(url, None)),
                    status: AssetStatus::Pending,
                    byte_size: None,
                })
                .collect();
            return Localized {
                html: html.to_string(),
                assets,
            };
        }

        let downloads = self.download_all(&urls).await;

        let mut namer = AssetNamer::new();
        let mut assets = Vec::with_capacity(urls.len());
        for (url, download) in urls.iter().zip(downloads) {
            let content_type = download.as_ref().ok().and_then(|p| p.content_type.as_deref());
            let name = namer.name(url, content_type);
            let local_relative_path = format!("{asset_dir}/{name}");

            let (status, byte_size) = match download {
                Ok(page) => {
                    let target = doc_dir.join(asset_dir).join(&name);
                    match writer.write(&target, &page.bytes) {
                        Ok(_) => (AssetStatus::Fetched, Some(page.bytes.len() as u64)),
                        Err(err) => {
                            tracing::warn!(%url, error = %err, "could not store asset");
                            (AssetStatus::Failed, None)
                        }
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "asset left remote");
                    (AssetStatus::Failed, None)
                }
            };
            assets.push(Asset {
                remote_url: url.to_string(),
                local_relative_path,
                status,
                byte_size,
            });
        }

        let html = rewrite(html, base, &assets);
        Localized { html, assets }
    }

    /// One task per URL, at most `asset_concurrency` in flight. Results
    /// come back in input order.
    async fn download_all(&self, urls: &[Url]) -> Vec<Result<FetchedPage>> {
        let semaphore = Arc::new(Semaphore::new(self.options.asset_concurrency.max(1)));
        let mut handles = Vec::with_capacity(urls.len());

        for url in urls {
            let semaphore = Arc::clone(&semaphore);
            let fetcher = Arc::clone(&self.fetcher);
            let options = Arc::clone(&self.options);
            let url = url.clone();
            handles.push(tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.map_err(|e| Error::AssetFetch {
                    url: url.to_string(),
                    reason: e.to_string(),
                })?;
                fetch_with_retry(fetcher.as_ref(), &url, &options).await
            }));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (url, handle) in urls.iter().zip(handles) {
            let result = handle.await.unwrap_or_else(|e| {
                Err(Error::AssetFetch {
                    url: url.to_string(),
                    reason: format!("download task failed: {e}"),
                })
            });
            results.push(result);
        }
        results
    }
}

/// Point fetched images at their local copies.
///
/// Lazy-load and `srcset` attributes are dropped from rewritten images, and
/// `<source>` siblings inside a `<picture>` go with them. Failed images keep
/// their original attributes; a lazy-only image also gets its remote URL
/// as `src`.
#[must_use]
pub fn rewrite(html: &str, base: Option<&Url>, assets: &[Asset]) -> String {
    let by_url: HashMap<&str, &Asset> = assets.iter().map(|a| (a.remote_url.as_str(), a)).collect();
    let doc = dom::parse_fragment(html);

    for img in doc.select("img").iter() {
        let Some((attr, reference)) = image_reference(&img) else {
            continue;
        };
        let Some(url) = url_utils::resolve_reference(&reference, base) else {
            continue;
        };
        let Some(asset) = by_url.get(url.as_str()) else {
            continue;
        };

        match asset.status {
            AssetStatus::Fetched => {
                dom::set_attribute(&img, "src", &asset.local_relative_path);
                for lazy in LAZY_ATTRS {
                    dom::remove_attribute(&img, lazy);
                }
                if let Some(parent) = img.nodes().first().and_then(|n| n.parent()) {
                    let parent = Selection::from(parent);
                    if dom::is_one_of_tags(&parent, &["picture"]) {
                        dom::remove_matching(&parent, "source");
                    }
                }
            }
            AssetStatus::Failed if attr != "src" => {
                dom::set_attribute(&img, "src", url.as_str());
            }
            AssetStatus::Failed | AssetStatus::Pending => {}
        }
    }

    dom::inner_html(&doc.select("body")).to_string()
}
