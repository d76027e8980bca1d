//! Slug Generation
//!
//! Derives the file-naming identity of a document from its title, falling
//! back to the URL path and finally to a UTC timestamp.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use unicode_normalization::UnicodeNormalization;
use url::Url;

use crate::patterns::SLUG_SEPARATOR_RUN;
use crate::url_utils::{percent_decode, split_extension};

/// Normalize `text` into a slug of at most `max_len` bytes.
///
/// Returns `None` if nothing ASCII-alphanumeric survives.
#[must_use]
pub fn slugify(text: &str, max_len: usize) -> Option<String> {
    let ascii: String = text.nfkd().filter(char::is_ascii).collect();
    let lowered = ascii.to_ascii_lowercase();
    let slug = SLUG_SEPARATOR_RUN.replace_all(&lowered, "-");
    let slug = truncate(slug.trim_matches('-'), max_len);
    (!slug.is_empty()).then(|| slug.to_string())
}

/// Cut to `max_len` bytes, preferring the last `-` boundary.
fn truncate(slug: &str, max_len: usize) -> &str {
    if slug.len() <= max_len {
        return slug;
    }
    let cut = &slug[..max_len];
    let cut = match cut.rfind('-') {
        Some(pos) if pos > 0 && slug.as_bytes().get(max_len) != Some(&b'-') => &cut[..pos],
        _ => cut,
    };
    cut.trim_matches('-')
}

/// Last non-empty path segment without its extension.
fn url_stem(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = percent_decode(segment);
    Some(split_extension(&decoded).0.to_string())
}

/// Per-run slug source.
///
/// Title slugs are a pure function of the title. Timestamp fallbacks are
/// remembered so that two fallbacks within the same second still differ.
#[derive(Debug, Clone)]
pub struct SlugGenerator {
    max_len: usize,
    issued: HashSet<String>,
}

impl SlugGenerator {
    #[must_use]
    pub fn new(max_len: usize) -> Self {
        Self {
            max_len: max_len.max(1),
            issued: HashSet::new(),
        }
    }

    /// Slug from the title, else the URL's last path segment, else a
    /// timestamp. Never empty.
    pub fn generate(&mut self, title: Option<&str>, url: Option<&Url>) -> String {
        title
            .and_then(|t| slugify(t, self.max_len))
            .or_else(|| url.and_then(url_stem).and_then(|s| slugify(&s, self.max_len)))
            .unwrap_or_else(|| self.fallback())
    }

    /// `post-YYYYMMDD-HHMMSS` for the current UTC time.
    pub fn fallback(&mut self) -> String {
        self.fallback_at(Utc::now())
    }

    /// Timestamp fallback for a fixed instant; repeats get `-2`, `-3`, ...
    pub fn fallback_at(&mut self, now: DateTime<Utc>) -> String {
        let base = format!("post-{}", now.format("%Y%m%d-%H%M%S"));
        let mut candidate = base.clone();
        let mut n = 1;
        while self.issued.contains(&candidate) {
            n += 1;
            candidate = format!("{base}-{n}");
        }
        self.issued.insert(candidate.clone());
        candidate
    }
}

impl Default for SlugGenerator {
    fn default() -> Self {
        Self::new(80)
    }
}
