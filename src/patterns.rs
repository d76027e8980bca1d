//! Compiled regex patterns and static keyword tables.
//!
//! All patterns are compiled once at first use using `LazyLock`. The
//! tables are process-wide configuration and are never mutated.

#![allow(clippy::expect_used)]

use std::sync::LazyLock;

use regex::Regex;

// =============================================================================
// Noise Detection
// =============================================================================

/// Tags whose subtrees are always chrome, never article content.
pub const NOISE_TAGS: &[&str] = &[
    "header", "nav", "aside", "footer", "form", "noscript", "script", "style", "iframe",
];

/// Substrings that mark a class/id token as noise.
pub const NOISE_KEYWORDS: &[&str] = &[
    "share", "comment", "recommend", "related", "sidebar", "advert", "reward", "meta", "profile",
];

/// Prefixes that mark a class/id token as noise (`ad-slot`, `ads-top`).
pub const NOISE_TOKEN_PREFIXES: &[&str] = &["ad-", "ads-", "ad_"];

/// Tokens that are noise only when they are the whole class/id token.
///
/// Substring matching on these would hit `navy`, `header`, `download`.
pub const NOISE_EXACT_TOKENS: &[&str] = &["nav", "ad", "ads", "footer"];

/// Matches class/id tokens the heuristic scorer penalizes.
///
/// Broader than the removal keywords: a `toc-nav` or `site-footer`
/// container should never win, but removing every `*-nav` inside an
/// article would be too aggressive.
pub static SCORER_NOISE_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(^|[-_])(nav|navbar|navigation|menu|sidebar|footer|comments?|recommend(ed)?|related|ads?|advert(isement)?|share|sharing|reward|breadcrumbs?)($|[-_])",
    )
    .expect("SCORER_NOISE_TOKEN regex")
});

// =============================================================================
// Code Blocks
// =============================================================================

/// Matches `language-rust` / `lang-rust` style classes.
pub static CODE_LANGUAGE_CLASS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:language|lang)-([A-Za-z0-9_+#.-]+)$").expect("CODE_LANGUAGE_CLASS regex")
});

// =============================================================================
// Slugs and File Names
// =============================================================================

/// Runs of characters that are not allowed in a slug.
pub static SLUG_SEPARATOR_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("SLUG_SEPARATOR_RUN regex"));

/// Runs of characters that are not allowed in a local asset file name.
pub static FILENAME_UNSAFE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9._-]+").expect("FILENAME_UNSAFE_RUN regex"));

/// Fallback slug shape: `post-YYYYMMDD-HHMMSS` with an optional `-N` suffix.
pub static TIMESTAMP_SLUG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^post-\d{8}-\d{6}(-\d+)?$").expect("TIMESTAMP_SLUG regex")
});
