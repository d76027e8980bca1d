//! Site Profile Resolution
//!
//! Classifies a page into a known blogging platform so that the extractor
//! can try that platform's content selectors before falling back to
//! heuristics. Profiles are one static declarative table; adding a
//! platform means adding a row, not another branch.

use std::fmt;

use url::Url;

use crate::dom::Document;

/// A recognized blogging platform, or none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Profile {
    /// blog.csdn.net articles.
    Csdn,
    /// Hexo-generated static blogs and themes with the same markup
    /// conventions (NexT, Butterfly, Icarus, ...).
    HexoCommon,
    /// Anything else. Always has an empty selector list.
    Generic,
}

impl Profile {
    /// Stable identifier used in reports (`csdn`, `hexo-common`, `generic`).
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Csdn => "csdn",
            Self::HexoCommon => "hexo-common",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// How a [`ProfileRule`] recognizes a page.
#[derive(Debug, Clone, Copy)]
pub enum ProfileMatcher {
    /// Host equals one of these domains or is a subdomain of one.
    HostSuffix(&'static [&'static str]),
    /// Document contains an element matching any of these selectors.
    Fingerprint(&'static [&'static str]),
}

/// One row of the profile table.
#[derive(Debug, Clone, Copy)]
pub struct ProfileRule {
    pub profile: Profile,
    pub matcher: ProfileMatcher,
    /// Content selectors, most specific first.
    pub selectors: &'static [&'static str],
}

const CSDN_SELECTORS: &[&str] = &["div.blog-content-box", "div#content_views", "div.article_content"];

const HEXO_SELECTORS: &[&str] = &[
    "article.post",
    "article.post-block",
    "article.article",
    "div.post-body",
    "div#article-container",
    "div.entry-content",
    "div.post-content",
    "main article",
];

/// The static profile table. Host rules are consulted before fingerprints
/// regardless of their position here.
pub static PROFILE_RULES: &[ProfileRule] = &[
    ProfileRule {
        profile: Profile::Csdn,
        matcher: ProfileMatcher::HostSuffix(&["csdn.net"]),
        selectors: CSDN_SELECTORS,
    },
    ProfileRule {
        profile: Profile::Csdn,
        matcher: ProfileMatcher::Fingerprint(&["div#content_views.markdown_views", "div.blog-content-box"]),
        selectors: CSDN_SELECTORS,
    },
    ProfileRule {
        profile: Profile::HexoCommon,
        matcher: ProfileMatcher::Fingerprint(&[
            r#"meta[name="generator"][content^="Hexo"]"#,
            "div#article-container",
            "article.post-block",
            "div.post-body",
        ]),
        selectors: HEXO_SELECTORS,
    },
];

/// Result of profile resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedProfile {
    pub profile: Profile,
    /// Selectors to try in order; empty for [`Profile::Generic`].
    pub selectors: &'static [&'static str],
}

impl ResolvedProfile {
    /// The generic profile with no selectors.
    #[must_use]
    pub fn generic() -> Self {
        Self {
            profile: Profile::Generic,
            selectors: &[],
        }
    }
}

/// Resolve the profile for a page.
///
/// Host rules win over DOM fingerprints; fingerprints are only consulted
/// when no host rule matches (unknown or shared hosting domains such as
/// `github.io`). Pages matching neither are [`Profile::Generic`].
#[must_use]
pub fn resolve(url: Option<&Url>, doc: &Document) -> ResolvedProfile {
    let host = url.and_then(Url::host_str).map(normalize_host);

    if let Some(host) = host.as_deref() {
        for rule in PROFILE_RULES {
            if let ProfileMatcher::HostSuffix(domains) = rule.matcher {
                if domains.iter().any(|d| host_matches(host, d)) {
                    tracing::debug!(profile = %rule.profile, host, "profile matched by host");
                    return ResolvedProfile {
                        profile: rule.profile,
                        selectors: rule.selectors,
                    };
                }
            }
        }
    }

    for rule in PROFILE_RULES {
        if let ProfileMatcher::Fingerprint(selectors) = rule.matcher {
            if let Some(hit) = selectors.iter().find(|s| doc.select(s).exists()) {
                tracing::debug!(profile = %rule.profile, fingerprint = hit, "profile matched by DOM");
                return ResolvedProfile {
                    profile: rule.profile,
                    selectors: rule.selectors,
                };
            }
        }
    }

    ResolvedProfile::generic()
}

fn normalize_host(host: &str) -> String {
    let host = host.trim().trim_end_matches('.').to_ascii_lowercase();
    host.strip_prefix("www.").map(str::to_string).unwrap_or(host)
}

fn host_matches(host: &str, domain: &str) -> bool {
    host == domain || host.strip_suffix(domain).is_some_and(|rest| rest.ends_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom;

    fn url(s: &str) -> Url {
        match Url::parse(s) {
            Ok(u) => u,
            Err(e) => panic!("bad test url {s}: {e}"),
        }
    }

    #[test]
    fn csdn_host_resolves_by_suffix() {
        let doc = dom::parse("<html><body><p>x</p></body></html>");
        let resolved = resolve(Some(&url("https://blog.csdn.net/user/article/details/1")), &doc);

        assert_eq!(resolved.profile, Profile::Csdn);
        assert_eq!(resolved.selectors[0], "div.blog-content-box");
    }

    #[test]
    fn host_suffix_requires_label_boundary() {
        assert!(host_matches("csdn.net", "csdn.net"));
        assert!(host_matches("blog.csdn.net", "csdn.net"));
        assert!(!host_matches("notcsdn.net", "csdn.net"));
    }

    #[test]
    fn www_prefix_and_case_are_ignored() {
        assert_eq!(normalize_host("WWW.CSDN.NET."), "csdn.net");
    }

    #[test]
    fn hexo_resolves_by_generator_meta() {
        let doc = dom::parse(
            r#"<html><head><meta name="generator" content="Hexo 7.0.0"></head><body></body></html>"#,
        );
        let resolved = resolve(Some(&url("https://someone.github.io/2024/01/post/")), &doc);

        assert_eq!(resolved.profile, Profile::HexoCommon);
        assert_eq!(resolved.selectors.first(), Some(&"article.post"));
    }

    #[test]
    fn hexo_resolves_by_container_fingerprint() {
        let doc = dom::parse(r#"<html><body><div id="article-container">x</div></body></html>"#);
        let resolved = resolve(None, &doc);

        assert_eq!(resolved.profile, Profile::HexoCommon);
    }

    #[test]
    fn host_rule_beats_fingerprint() {
        let doc = dom::parse(r#"<html><body><div class="post-body">x</div></body></html>"#);
        let resolved = resolve(Some(&url("https://blog.csdn.net/a")), &doc);

        assert_eq!(resolved.profile, Profile::Csdn);
    }

    #[test]
    fn unknown_host_is_generic_with_no_selectors() {
        let doc = dom::parse("<html><body><article><p>x</p></article></body></html>");
        let resolved = resolve(Some(&url("https://example.com/post")), &doc);

        assert_eq!(resolved, ResolvedProfile::generic());
        assert!(resolved.selectors.is_empty());
        assert_eq!(resolved.profile.to_string(), "generic");
    }
}
