//! Content Extraction
//!
//! Chooses exactly one content root: the first profile selector whose match
//! carries enough text, otherwise the heuristic winner.

use crate::dom::{self, Document, Selection};
use crate::error::{Error, Result};
use crate::options::Options;
use crate::profile::ResolvedProfile;
use crate::scorer::{self, ContentCandidate, Strategy};

/// Remove `script`, `style`, `noscript` and `template` everywhere.
///
/// Returns the number of removed elements.
pub fn strip_non_content(doc: &Document) -> usize {
    let found = doc.select(&dom::NON_CONTENT_TAGS.join(", "));
    let count = found.length();
    found.remove();
    count
}

/// First profile selector match with more than `min_text_length` visible
/// characters.
#[must_use]
pub fn by_profile<'a>(
    doc: &'a Document,
    profile: &ResolvedProfile,
    options: &Options,
) -> Option<ContentCandidate<'a>> {
    for selector in profile.selectors {
        let Some(node) = doc.select(selector).nodes().first().copied() else {
            continue;
        };
        let sel = Selection::from(node);
        let text_length = dom::visible_text_len(&sel);
        if text_length > options.min_text_length {
            tracing::debug!(selector, text_length, "profile selector accepted");
            #[allow(clippy::cast_precision_loss)]
            let score = text_length as f64;
            return Some(ContentCandidate {
                node,
                score,
                text_length,
                depth: dom::depth(&sel),
                strategy: Strategy::Profile(profile.profile.name()),
            });
        }
        tracing::debug!(selector, text_length, "profile selector too short");
    }
    None
}

/// Pick the content root for `doc`.
///
/// Non-content elements are stripped from the whole document first.
/// Profile selectors are tried before the heuristic scorer; the scorer
/// coming up empty is the only failure.
pub fn extract<'a>(
    doc: &'a Document,
    profile: &ResolvedProfile,
    options: &Options,
) -> Result<ContentCandidate<'a>> {
    strip_non_content(doc);

    if let Some(candidate) = by_profile(doc, profile, options) {
        return Ok(candidate);
    }
    scorer::best_candidate(doc, options).ok_or(Error::ExtractionFailed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Profile, PROFILE_RULES};

    fn csdn() -> ResolvedProfile {
        let rule = PROFILE_RULES.iter().find(|r| r.profile == Profile::Csdn);
        match rule {
            Some(rule) => ResolvedProfile {
                profile: rule.profile,
                selectors: rule.selectors,
            },
            None => panic!("csdn rule missing"),
        }
    }

    fn text(n: usize) -> String {
        "abcdefghij".repeat(n / 10)
    }

    #[test]
    fn profile_selector_wins_over_bigger_heuristic_candidate() {
        let html = format!(
            r#"<html><body>
                <div id="content_views"><p>{}</p></div>
                <article>{}</article>
            </body></html>"#,
            text(200),
            (0..10).map(|_| format!("<p>{}</p>", text(300))).collect::<String>()
        );
        let doc = dom::parse(&html);
        let candidate = extract(&doc, &csdn(), &Options::default());

        let candidate = match candidate {
            Ok(c) => c,
            Err(err) => panic!("expected Ok(_), got Err({err:?})"),
        };
        assert_eq!(candidate.strategy, Strategy::Profile("csdn"));
        assert_eq!(candidate.selection().attr("id").map(|s| s.to_string()), Some("content_views".into()));
    }

    #[test]
    fn short_profile_match_falls_through_to_next_selector() {
        let html = format!(
            r#"<div class="blog-content-box">tiny</div><div class="article_content"><p>{}</p></div>"#,
            text(160)
        );
        let doc = dom::parse(&html);
        let candidate = by_profile(&doc, &csdn(), &Options::default());

        assert!(candidate.is_some_and(|c| c.selection().has_class("article_content")));
    }

    #[test]
    fn threshold_is_strict() {
        let html = format!(r#"<div id="content_views">{}</div>"#, text(150));
        let doc = dom::parse(&html);
        assert!(by_profile(&doc, &csdn(), &Options::default()).is_none());
    }

    #[test]
    fn generic_uses_heuristic() {
        let html = format!(
            "<html><body><main>{}</main></body></html>",
            (0..4).map(|_| format!("<p>{}</p>", text(100))).collect::<String>()
        );
        let doc = dom::parse(&html);
        let candidate = extract(&doc, &ResolvedProfile::generic(), &Options::default());

        assert!(matches!(candidate, Ok(ref c) if c.strategy == Strategy::Heuristic));
    }

    #[test]
    fn scripts_do_not_count_as_content() {
        let html = format!(
            r#"<div id="content_views"><script>{}</script><p>short</p></div>"#,
            text(400)
        );
        let doc = dom::parse(&html);
        let result = extract(&doc, &csdn(), &Options::default());

        assert!(matches!(result, Err(Error::ExtractionFailed)));
        assert!(doc.select("script").is_empty());
    }
}
