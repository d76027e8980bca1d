//! URL Utility Functions
//!
//! Page URL validation, image reference resolution and the file-name
//! helpers used when localizing assets.

use url::Url;

use crate::error::{Error, Result};
use crate::patterns::FILENAME_UNSAFE_RUN;

/// Check if a string is a valid absolute http(s) URL with a host.
#[must_use]
pub fn parse_absolute(s: &str) -> Option<Url> {
    let s = s.trim();
    if !s.starts_with("http://") && !s.starts_with("https://") {
        return None;
    }
    Url::parse(s).ok().filter(|url| url.host().is_some())
}

/// Parse the page URL given on the command line.
pub fn parse_page_url(s: &str) -> Result<Url> {
    parse_absolute(s).ok_or_else(|| Error::InvalidUrl(s.trim().to_string()))
}

/// Resolve an image reference against the page URL.
///
/// Returns `None` for empty references, `data:` URIs and anything that
/// does not end up as an absolute http(s) URL. The fragment is dropped so
/// that `a.png#x` and `a.png` are the same asset.
#[must_use]
pub fn resolve_reference(reference: &str, base: Option<&Url>) -> Option<Url> {
    let reference = reference.trim();
    if reference.is_empty() {
        return None;
    }
    let lowered = reference.get(..11).unwrap_or(reference).to_ascii_lowercase();
    if ["data:", "javascript:", "mailto:", "tel:", "about:", "blob:"]
        .iter()
        .any(|scheme| lowered.starts_with(scheme))
    {
        return None;
    }

    let mut url = match base {
        Some(base) => base.join(reference).ok()?,
        None => Url::parse(reference).ok()?,
    };
    if !matches!(url.scheme(), "http" | "https") || url.host().is_none() {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

/// Decode `%XX` escapes, leaving malformed sequences as they are.
/// Invalid UTF-8 after decoding becomes U+FFFD.
#[must_use]
pub fn percent_decode(segment: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(segment.as_bytes())).into_owned()
}

/// Last non-empty path segment of a URL, percent-decoded.
///
/// # Examples
/// ```
/// use rs_blog2md::url_utils::extract_filename;
/// use url::Url;
///
/// let url = Url::parse("https://example.com/images/my%20photo.jpg?v=123").unwrap();
/// assert_eq!(extract_filename(&url), "my photo.jpg");
/// let root = Url::parse("https://example.com/").unwrap();
/// assert_eq!(extract_filename(&root), "");
/// ```
#[must_use]
pub fn extract_filename(url: &Url) -> String {
    let segment = url
        .path_segments()
        .and_then(|mut segments| segments.rfind(|s| !s.is_empty()))
        .unwrap_or("");
    let decoded = percent_decode(segment);
    let decoded = decoded.trim();
    if decoded == "." || decoded == ".." {
        return String::new();
    }
    decoded.to_string()
}

/// Map a file name to a conservative portable form: runs of anything but
/// ASCII alphanumerics, `.`, `_` and `-` become `-`.
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    let replaced = FILENAME_UNSAFE_RUN.replace_all(name, "-");
    replaced.trim_matches(|c| c == '-' || c == '.').to_string()
}

/// Split `photo.final.png` into `("photo.final", Some("png"))`.
#[must_use]
pub fn split_extension(name: &str) -> (&str, Option<&str>) {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    }
}

/// File extension for an image `Content-Type`, if it is a known one.
#[must_use]
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let mime = content_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    let ext = match mime.as_str() {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" | "image/pjpeg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        "image/avif" => "avif",
        "image/bmp" => "bmp",
        "image/x-icon" | "image/vnd.microsoft.icon" => "ico",
        "image/tiff" => "tiff",
        _ => return None,
    };
    Some(ext)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        match Url::parse("https://blog.example.com/2024/01/post.html") {
            Ok(u) => u,
            Err(e) => panic!("bad base: {e}"),
        }
    }

    #[test]
    fn test_parse_page_url() {
        assert!(parse_page_url("https://example.com/a").is_ok());
        assert!(parse_page_url("  http://example.com  ").is_ok());
        assert!(matches!(parse_page_url("example.com"), Err(Error::InvalidUrl(_))));
        assert!(matches!(parse_page_url("ftp://example.com/x"), Err(Error::InvalidUrl(_))));
    }

    #[test]
    fn test_resolve_reference_relative_and_protocol_relative() {
        let base = base();
        let rel = resolve_reference("../img/a.png", Some(&base)).map(String::from);
        assert_eq!(rel.as_deref(), Some("https://blog.example.com/2024/img/a.png"));

        let proto = resolve_reference("//cdn.example.net/b.png", Some(&base)).map(String::from);
        assert_eq!(proto.as_deref(), Some("https://cdn.example.net/b.png"));
    }

    #[test]
    fn test_resolve_reference_drops_fragment_keeps_query() {
        let url = resolve_reference("/a.png?w=200#frag", Some(&base())).map(String::from);
        assert_eq!(url.as_deref(), Some("https://blog.example.com/a.png?w=200"));
    }

    #[test]
    fn test_resolve_reference_skips_data_and_empty() {
        assert!(resolve_reference("data:image/png;base64,AAAA", Some(&base())).is_none());
        assert!(resolve_reference("DATA:image/gif;base64,R0lG", Some(&base())).is_none());
        assert!(resolve_reference("   ", Some(&base())).is_none());
        assert!(resolve_reference("/a.png", None).is_none());
    }

    #[test]
    fn test_percent_decode() {
        assert_eq!(percent_decode("a%20b"), "a b");
        assert_eq!(percent_decode("%E5%9B%BE.png"), "图.png");
        assert_eq!(percent_decode("100%"), "100%");
        assert_eq!(percent_decode("%zz"), "%zz");
        assert_eq!(percent_decode("%41"), "A");
        assert_eq!(percent_decode("x%4"), "x%4");
        assert_eq!(percent_decode("%FF.png"), "\u{FFFD}.png");
    }

    #[test]
    fn test_extract_filename() {
        let url = Url::parse("https://example.com/images/photo.jpg?v=1").ok();
        assert_eq!(url.as_ref().map(extract_filename).as_deref(), Some("photo.jpg"));
        let dir = Url::parse("https://example.com/images/").ok();
        assert_eq!(dir.as_ref().map(extract_filename).as_deref(), Some("images"));
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("my photo (1).png"), "my-photo-1-.png");
        assert_eq!(sanitize_filename("图.png"), "png");
        assert_eq!(sanitize_filename("..."), "");
    }

    #[test]
    fn test_split_extension() {
        assert_eq!(split_extension("a.b.png"), ("a.b", Some("png")));
        assert_eq!(split_extension("README"), ("README", None));
        assert_eq!(split_extension(".hidden"), (".hidden", None));
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_content_type("image/svg+xml; charset=utf-8"), Some("svg"));
        assert_eq!(extension_for_content_type("text/html"), None);
    }
}
