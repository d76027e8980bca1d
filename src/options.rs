//! Configuration options for conversion.
//!
//! The `Options` struct holds the extraction thresholds, scoring weights and
//! network limits. Every field has a default, so a TOML file only needs the
//! keys it wants to change.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Desktop browser User-Agent sent when none is configured.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Configuration options for extraction and asset localization.
///
/// All fields are public for easy configuration. Use `Default::default()`
/// for standard settings.
///
/// # Example
///
/// ```rust
/// use rs_blog2md::Options;
///
/// let options = Options {
///     min_text_length: 80,
///     asset_concurrency: 2,
///     ..Options::default()
/// };
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Options {
    /// Minimum visible text length (characters) a container needs before it
    /// is accepted, for both profile selectors and heuristic candidates.
    ///
    /// Guards against selectors that match an empty placeholder.
    ///
    /// Default: `150`
    pub min_text_length: usize,

    /// Minimum heuristic score the winning candidate must reach.
    ///
    /// Default: `200.0`
    pub min_heuristic_score: f64,

    /// Score added per `<p>` inside a candidate.
    ///
    /// Default: `50.0`
    pub paragraph_bonus: f64,

    /// Score added per `<h1>`..`<h6>` inside a candidate.
    ///
    /// Default: `30.0`
    pub heading_bonus: f64,

    /// Weight of the link-density penalty.
    ///
    /// The penalty is `link_density_penalty * link_density * text_length`,
    /// so a weight of `1.0` removes all anchor text from the score.
    ///
    /// Default: `1.0`
    pub link_density_penalty: f64,

    /// Score subtracted when a candidate's class/id matches a noise keyword.
    ///
    /// Default: `500.0`
    pub noise_penalty: f64,

    /// Score added to `<article>` and `<main>` candidates.
    ///
    /// Default: `100.0`
    pub semantic_bonus: f64,

    /// Candidates within this many points of the top score count as tied,
    /// and the shallowest of them wins.
    ///
    /// Default: `20.0`
    pub tie_tolerance: f64,

    /// Maximum slug length in bytes (slugs are ASCII).
    ///
    /// Default: `80`
    pub max_slug_length: usize,

    /// Timeout for the page fetch and for each asset fetch, in seconds.
    ///
    /// Default: `15`
    pub timeout_secs: u64,

    /// User-Agent header for every request.
    ///
    /// Default: [`DEFAULT_USER_AGENT`]
    pub user_agent: String,

    /// Download and rewrite images.
    ///
    /// Default: `true`
    pub localize_assets: bool,

    /// Maximum number of concurrent asset downloads.
    ///
    /// Default: `4`
    pub asset_concurrency: usize,

    /// Additional attempts per asset after the first failure.
    ///
    /// Default: `2`
    pub asset_retries: usize,

    /// Delay before retry `n` is `n * asset_retry_backoff_ms`.
    ///
    /// Default: `500`
    pub asset_retry_backoff_ms: u64,

    /// Directory (relative to the document directory) for localized images.
    ///
    /// Default: `"assets"`
    pub asset_dir: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_text_length: 150,
            min_heuristic_score: 200.0,
            paragraph_bonus: 50.0,
            heading_bonus: 30.0,
            link_density_penalty: 1.0,
            noise_penalty: 500.0,
            semantic_bonus: 100.0,
            tie_tolerance: 20.0,
            max_slug_length: 80,
            timeout_secs: 15,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            localize_assets: true,
            asset_concurrency: 4,
            asset_retries: 2,
            asset_retry_backoff_ms: 500,
            asset_dir: "assets".to_string(),
        }
    }
}

impl Options {
    /// Parse options from TOML text. Missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let options: Self = toml::from_str(text).map_err(|e| Error::Config(e.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Load options from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&text)
    }

    /// Reject values that would stall or break a run.
    pub fn validate(&self) -> Result<()> {
        if self.asset_concurrency == 0 {
            return Err(Error::Config("asset_concurrency must be at least 1".into()));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config("timeout_secs must be at least 1".into()));
        }
        if self.asset_dir.trim().is_empty() {
            return Err(Error::Config("asset_dir must not be empty".into()));
        }
        if self.max_slug_length == 0 {
            return Err(Error::Config("max_slug_length must be at least 1".into()));
        }
        if self.tie_tolerance.is_nan() || self.tie_tolerance < 0.0 {
            return Err(Error::Config("tie_tolerance must be a non-negative number".into()));
        }
        Ok(())
    }

    /// Per-operation network timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Delay before the given retry attempt (1-based).
    #[must_use]
    pub fn retry_backoff(&self, attempt: usize) -> Duration {
        Duration::from_millis(self.asset_retry_backoff_ms.saturating_mul(attempt as u64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options_thresholds() {
        let opts = Options::default();

        assert_eq!(opts.min_text_length, 150);
        assert!((opts.min_heuristic_score - 200.0).abs() < f64::EPSILON);
        assert!((opts.paragraph_bonus - 50.0).abs() < f64::EPSILON);
        assert!((opts.heading_bonus - 30.0).abs() < f64::EPSILON);
        assert!((opts.link_density_penalty - 1.0).abs() < f64::EPSILON);
        assert_eq!(opts.max_slug_length, 80);
        assert_eq!(opts.timeout_secs, 15);
        assert_eq!(opts.user_agent, DEFAULT_USER_AGENT);
        assert!(opts.localize_assets);
        assert_eq!(opts.asset_concurrency, 4);
        assert_eq!(opts.asset_retries, 2);
        assert_eq!(opts.asset_dir, "assets");
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let opts = Options::from_toml_str("min_text_length = 40\nasset_concurrency = 8\n");
        let opts = match opts {
            Ok(opts) => opts,
            Err(err) => panic!("expected Ok(_), got Err({err:?})"),
        };

        assert_eq!(opts.min_text_length, 40);
        assert_eq!(opts.asset_concurrency, 8);
        assert_eq!(opts.timeout_secs, 15);
        assert_eq!(opts.asset_dir, "assets");
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let result = Options::from_toml_str("min_text_length = \"lots\"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let opts = Options {
            asset_concurrency: 0,
            ..Options::default()
        };
        assert!(matches!(opts.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_empty_asset_dir_is_rejected() {
        let result = Options::from_toml_str("asset_dir = \"  \"");
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_retry_backoff_is_linear() {
        let opts = Options {
            asset_retry_backoff_ms: 100,
            ..Options::default()
        };
        assert_eq!(opts.retry_backoff(1), Duration::from_millis(100));
        assert_eq!(opts.retry_backoff(3), Duration::from_millis(300));
    }

    #[test]
    fn test_negative_tie_tolerance_is_rejected() {
        for tie_tolerance in [-1.0, f64::NAN] {
            let opts = Options { tie_tolerance, ..Options::default() };
            assert!(matches!(opts.validate(), Err(Error::Config(_))), "{tie_tolerance}");
        }
        let exact = Options { tie_tolerance: 0.0, ..Options::default() };
        assert!(exact.validate().is_ok());
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let result = Options::from_toml_file("/definitely/not/here.toml");
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
