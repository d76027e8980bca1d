//! Result types for a conversion run.
//!
//! [`Document`] is the identity of the page being converted,
//! [`ExtractionResult`] the converted content and [`RunReport`] the
//! observable summary printed by the binary.

use std::path::PathBuf;

use serde::Serialize;

use crate::assets::{Asset, AssetStatus};
use crate::scorer::Strategy;

/// The page being converted. Built once per run; the slug is never
/// regenerated afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct Document {
    pub source_url: String,
    #[serde(skip)]
    pub raw_html: String,
    pub title: Option<String>,
    pub slug: String,
    pub strategy_used: Strategy,
}

/// Cleaned content in both output formats.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExtractionResult {
    /// `<article>` fragment with local image references.
    pub cleaned_html: String,
    /// Markdown rendered from `cleaned_html`, title heading included.
    pub markdown_text: String,
    /// One entry per distinct image, first-discovery order.
    pub assets: Vec<Asset>,
    /// Visible characters of the content.
    pub char_count: usize,
}

impl ExtractionResult {
    #[must_use]
    pub fn assets_with(&self, status: AssetStatus) -> usize {
        self.assets.iter().filter(|a| a.status == status).count()
    }
}

/// Summary of one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub source_url: String,
    pub slug: String,
    pub title: Option<String>,
    pub strategy: Strategy,
    pub char_count: usize,
    /// No content root was found; the noise-filtered page body was written instead.
    pub degraded: bool,
    /// Noise subtrees and empty wrappers removed from the content.
    pub removed_nodes: usize,
    pub assets_fetched: usize,
    pub assets_failed: usize,
    /// Files that were written, output documents first.
    pub written: Vec<PathBuf>,
    /// One message per output document that could not be written.
    pub write_errors: Vec<String>,
}

impl RunReport {
    /// Both output documents were written.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.write_errors.is_empty()
    }

    /// The report as pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
