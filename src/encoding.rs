//! Character encoding detection and transcoding.
//!
//! Fetched pages are decoded to UTF-8 before parsing. The charset comes
//! from the HTTP `Content-Type` header when it names one, otherwise from
//! the document's own `<meta>` declarations.

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use std::sync::LazyLock;

/// Match `<meta charset="...">` tag
#[allow(clippy::expect_used)]
static CHARSET_META_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+charset\s*=\s*["']?([^"'\s>;]+)"#).expect("valid regex")
});

/// Match `<meta http-equiv="Content-Type" content="...; charset=...">` tag
#[allow(clippy::expect_used)]
static HTTP_EQUIV_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)<meta[^>]+http-equiv\s*=\s*["']?content-type["']?[^>]+content\s*=\s*["']?[^"'>]*;\s*charset\s*=\s*([^"'\s>]+)"#).expect("valid regex")
});

/// Match the `charset` parameter of a `Content-Type` header value
#[allow(clippy::expect_used)]
static HEADER_CHARSET_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)charset\s*=\s*["']?([^"'\s;]+)"#).expect("valid regex")
});

/// Encoding named by a `Content-Type` header, if any and if known.
#[must_use]
pub fn charset_from_content_type(content_type: &str) -> Option<&'static Encoding> {
    HEADER_CHARSET_RE
        .captures(content_type)
        .and_then(|c| c.get(1))
        .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
}

/// Detect character encoding from HTML bytes.
///
/// Looks for charset declarations in the following order:
/// 1. `<meta charset="...">`
/// 2. `<meta http-equiv="Content-Type" content="...; charset=...">`
/// 3. Defaults to UTF-8 if no declaration found
///
/// Only examines the first 1024 bytes.
#[must_use]
pub fn detect_encoding(html: &[u8]) -> &'static Encoding {
    let head = &html[..html.len().min(1024)];
    let head_str = String::from_utf8_lossy(head);

    [&*CHARSET_META_RE, &*HTTP_EQUIV_CHARSET_RE]
        .iter()
        .find_map(|re| {
            re.captures(&head_str)
                .and_then(|c| c.get(1))
                .and_then(|m| Encoding::for_label(m.as_str().as_bytes()))
        })
        .unwrap_or(UTF_8)
}

/// Decode a fetched page to a UTF-8 string.
///
/// The header charset wins over in-document declarations. Invalid sequences
/// are replaced with U+FFFD rather than failing.
///
/// # Examples
///
/// ```
/// use rs_blog2md::encoding::decode_html;
///
/// let bytes = b"<html><body>caf\xe9</body></html>";
/// let html = decode_html(bytes, Some("text/html; charset=ISO-8859-1"));
/// assert!(html.contains("café"));
/// ```
#[must_use]
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> String {
    let encoding = content_type
        .and_then(charset_from_content_type)
        .unwrap_or_else(|| detect_encoding(bytes));

    if encoding == UTF_8 {
        return String::from_utf8_lossy(bytes).into_owned();
    }

    let (decoded, used, had_errors) = encoding.decode(bytes);
    if had_errors {
        tracing::debug!(encoding = used.name(), "replaced invalid byte sequences");
    }
    decoded.into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_utf8_from_meta_charset() {
        let html = br#"<html><head><meta charset="utf-8"></head><body>Test</body></html>"#;
        assert_eq!(detect_encoding(html), UTF_8);
    }

    #[test]
    fn detect_gbk_from_http_equiv() {
        let html = br#"<html><head><meta http-equiv="Content-Type" content="text/html; charset=gbk"></head></html>"#;
        assert_eq!(detect_encoding(html).name(), "GBK");
    }

    #[test]
    fn iso88591_maps_to_windows1252() {
        let html = br#"<meta charset="ISO-8859-1">"#;
        assert_eq!(detect_encoding(html).name(), "windows-1252");
    }

    #[test]
    fn default_is_utf8() {
        assert_eq!(detect_encoding(b"<html><body>Plain</body></html>"), UTF_8);
    }

    #[test]
    fn header_charset_parsing() {
        assert_eq!(
            charset_from_content_type("text/html; charset=\"Shift_JIS\"").map(Encoding::name),
            Some("Shift_JIS")
        );
        assert!(charset_from_content_type("text/html").is_none());
        assert!(charset_from_content_type("text/html; charset=bogus").is_none());
    }

    #[test]
    fn header_wins_over_meta() {
        // "café" in windows-1252, document wrongly claims UTF-8
        let bytes = b"<html><head><meta charset=\"utf-8\"></head><body>caf\xe9</body></html>";
        let html = decode_html(bytes, Some("text/html; charset=windows-1252"));
        assert!(html.contains("café"));
    }

    #[test]
    fn gbk_body_decodes() {
        let (encoded, _, _) = encoding_rs::GBK.encode("标题");
        let mut bytes = br#"<meta charset="gbk"><title>"#.to_vec();
        bytes.extend_from_slice(&encoded);
        bytes.extend_from_slice(b"</title>");

        assert!(decode_html(&bytes, None).contains("标题"));
    }

    #[test]
    fn invalid_utf8_is_lossy() {
        let html = decode_html(b"<p>ok \xff\xfe</p>", Some("text/html; charset=utf-8"));
        assert!(html.contains("ok"));
        assert!(html.contains('\u{FFFD}'));
    }
}
