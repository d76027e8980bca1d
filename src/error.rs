//! Error types for rs-blog2md.
//!
//! Each failure in a run is attributable to exactly one of these kinds.
//! Only [`Error::Fetch`] and [`Error::InvalidUrl`] abort a run; the others
//! degrade the output or affect a single file.

use std::path::PathBuf;

/// Error type for conversion operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The page could not be fetched (network, timeout or non-2xx status).
    #[error("failed to fetch {url}: {reason}")]
    Fetch {
        /// URL that was requested.
        url: String,
        /// Human-readable cause.
        reason: String,
    },

    /// Neither a profile selector nor the heuristic scorer found content
    /// above the minimum text length.
    #[error("no content container cleared the extraction threshold")]
    ExtractionFailed,

    /// A single image could not be downloaded after all retries.
    #[error("failed to fetch asset {url}: {reason}")]
    AssetFetch {
        /// Absolute URL of the image.
        url: String,
        /// Human-readable cause of the last attempt.
        reason: String,
    },

    /// An output file could not be written.
    #[error("failed to write {}: {source}", path.display())]
    Write {
        /// Path that was being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Options were invalid or a config file could not be loaded.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The page URL could not be parsed as an absolute http(s) URL.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Whether this error must abort the whole run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::InvalidUrl(_) | Self::Config(_))
    }
}

/// Result type alias for conversion operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_and_url_errors_are_fatal() {
        let fetch = Error::Fetch {
            url: "https://example.com".into(),
            reason: "timeout".into(),
        };
        assert!(fetch.is_fatal());
        assert!(Error::InvalidUrl("nope".into()).is_fatal());
    }

    #[test]
    fn per_item_errors_are_not_fatal() {
        assert!(!Error::ExtractionFailed.is_fatal());
        let asset = Error::AssetFetch {
            url: "https://x/y.png".into(),
            reason: "404".into(),
        };
        assert!(!asset.is_fatal());
        let write = Error::Write {
            path: PathBuf::from("out.md"),
            source: std::io::Error::other("disk full"),
        };
        assert!(!write.is_fatal());
        assert!(write.to_string().contains("out.md"));
    }
}
