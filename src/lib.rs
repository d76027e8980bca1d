//! # rs-blog2md
//!
//! Extract the main article from a blog page into a clean HTML fragment and
//! a Markdown draft, with images copied next to them.
//!
//! The page is classified into a known platform profile (CSDN, Hexo-style
//! blogs) whose content selectors are tried first; otherwise a heuristic
//! scorer picks the most article-like container. Navigation, share bars,
//! comments and similar chrome are pruned, highlighter markup is reduced to
//! plain `<pre><code>`, and every image is downloaded and re-pointed at its
//! local copy.
//!
//! ## Quick Start
//!
//! ```rust
//! use rs_blog2md::{extract, Strategy};
//!
//! let html = r#"<html><head><title>My Article</title></head>
//! <body><nav>Home | About</nav><article>
//! <p>Ownership is Rust's most unique feature and has deep implications for the rest of the language.</p>
//! <p>It enables Rust to make memory safety guarantees without needing a garbage collector.</p>
//! </article></body></html>"#;
//!
//! let extracted = extract(html);
//! assert_eq!(extracted.document.strategy_used, Strategy::Heuristic);
//! assert_eq!(extracted.document.slug, "my-article");
//! assert!(!extracted.content_html.contains("Home | About"));
//! ```
//!
//! Fetching, image localization and writing go through [`Pipeline`], which
//! takes its network and filesystem access as trait objects ([`Fetcher`],
//! [`Writer`]) so that it can run against in-memory fakes.

mod error;
mod options;
mod patterns;
mod result;

/// Typed DOM accessors over `dom_query`.
pub mod dom;

/// Site profile table and resolution.
pub mod profile;

/// Heuristic content scoring.
pub mod scorer;

/// Content root selection (profile selectors, then heuristics).
pub mod extractor;

/// Noise rules and the noise filter.
pub mod noise;

/// Highlighter markup normalization.
pub mod code_blocks;

/// Slug generation.
pub mod slug;

/// Image discovery, download and rewriting.
pub mod assets;

/// Page and asset fetching.
pub mod fetch;

/// Output writers.
pub mod writer;

/// Markdown rendering.
pub mod markdown;

/// Character encoding detection and transcoding.
pub mod encoding;

/// URL utilities for validation, resolution and file naming.
pub mod url_utils;

/// End-to-end conversion.
pub mod pipeline;

// Public API - re-exports
pub use assets::{Asset, AssetLocalizer, AssetStatus};
pub use error::{Error, Result};
pub use fetch::{FetchedPage, Fetcher, HttpFetcher};
pub use markdown::{MarkdownRenderer, QuickMarkdown};
pub use options::{Options, DEFAULT_USER_AGENT};
pub use pipeline::{Conversion, Extracted, Pipeline};
pub use profile::{Profile, ResolvedProfile};
pub use result::{Document, ExtractionResult, RunReport};
pub use scorer::{ContentCandidate, Strategy};
pub use slug::SlugGenerator;
pub use writer::{FsWriter, MemoryWriter, Writer};

/// Extract the article from decoded HTML with default options.
///
/// No URL is known, so only DOM fingerprints can select a profile.
#[must_use]
pub fn extract(html: &str) -> Extracted {
    extract_with_options(html, None, &Options::default())
}

/// Extract the article from decoded HTML.
///
/// The URL, when given, drives host-based profile selection and the slug
/// fallback.
#[must_use]
pub fn extract_with_options(html: &str, url: Option<&url::Url>, options: &Options) -> Extracted {
    let mut slugs = SlugGenerator::new(options.max_slug_length);
    pipeline::extract_article(html.to_string(), url, options, &mut slugs)
}

/// Extract the article from raw bytes, detecting the character encoding.
///
/// # Example
///
/// ```rust
/// use rs_blog2md::{extract_bytes, Options};
///
/// let html = b"<html><head><meta charset=\"ISO-8859-1\"><title>Caf\xE9</title></head><body></body></html>";
/// let extracted = extract_bytes(html, None, &Options::default());
/// assert_eq!(extracted.document.title.as_deref(), Some("Café"));
/// ```
#[must_use]
pub fn extract_bytes(html: &[u8], content_type: Option<&str>, options: &Options) -> Extracted {
    let decoded = encoding::decode_html(html, content_type);
    extract_with_options(&decoded, None, options)
}
