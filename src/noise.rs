//! Noise Filter
//!
//! Prunes navigation, sidebars, comments, related-post widgets, share bars
//! and ads from an extracted content node. The same rule table is consulted
//! by the heuristic scorer so that noise text never counts towards a
//! candidate's score.

use crate::dom::{self, NodeRef, Selection};
use crate::patterns::{NOISE_EXACT_TOKENS, NOISE_KEYWORDS, NOISE_TAGS, NOISE_TOKEN_PREFIXES};

/// How a [`NoiseRule`] recognizes the root of a noise subtree.
#[derive(Debug, Clone, Copy)]
pub enum NoiseMatcher {
    /// Element tag name is in the set.
    TagNames(&'static [&'static str]),
    /// Any class/id token contains one of the keywords.
    Keywords(&'static [&'static str]),
    /// Any class/id token starts with one of the prefixes.
    TokenPrefixes(&'static [&'static str]),
    /// Any class/id token equals one of the tokens.
    ExactTokens(&'static [&'static str]),
}

/// What a matching rule removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoiseScope {
    /// The matched element and everything below it.
    Subtree,
}

/// One entry of the static noise table.
#[derive(Debug, Clone, Copy)]
pub struct NoiseRule {
    pub matcher: NoiseMatcher,
    pub scope: NoiseScope,
}

impl NoiseRule {
    /// Whether `sel` is the root of a subtree this rule removes.
    #[must_use]
    pub fn matches(&self, sel: &Selection) -> bool {
        match self.matcher {
            NoiseMatcher::TagNames(tags) => dom::is_one_of_tags(sel, tags),
            NoiseMatcher::Keywords(keywords) => dom::class_id_tokens(sel)
                .iter()
                .any(|token| keywords.iter().any(|k| token.contains(k))),
            NoiseMatcher::TokenPrefixes(prefixes) => dom::class_id_tokens(sel)
                .iter()
                .any(|token| prefixes.iter().any(|p| token.starts_with(p))),
            NoiseMatcher::ExactTokens(exact) => dom::class_id_tokens(sel)
                .iter()
                .any(|token| exact.contains(&token.as_str())),
        }
    }
}

/// The process-wide noise table.
pub static NOISE_RULES: &[NoiseRule] = &[
    NoiseRule {
        matcher: NoiseMatcher::TagNames(NOISE_TAGS),
        scope: NoiseScope::Subtree,
    },
    NoiseRule {
        matcher: NoiseMatcher::Keywords(NOISE_KEYWORDS),
        scope: NoiseScope::Subtree,
    },
    NoiseRule {
        matcher: NoiseMatcher::TokenPrefixes(NOISE_TOKEN_PREFIXES),
        scope: NoiseScope::Subtree,
    },
    NoiseRule {
        matcher: NoiseMatcher::ExactTokens(NOISE_EXACT_TOKENS),
        scope: NoiseScope::Subtree,
    },
];

/// Elements whose descendants are never filtered.
pub const CODE_TAGS: &[&str] = &["pre", "code"];

/// Elements that keep an otherwise text-free wrapper alive.
const MEDIA_TAGS: &str = "img, picture, video, audio, svg, canvas, object, embed, math";

/// Whether `sel` matches any rule in [`NOISE_RULES`].
#[must_use]
pub fn is_noise(sel: &Selection) -> bool {
    NOISE_RULES.iter().any(|rule| rule.matches(sel))
}

/// [`is_noise`] for a raw node; false for text and comment nodes.
#[must_use]
pub fn is_noise_node(node: &NodeRef) -> bool {
    node.is_element() && is_noise(&Selection::from(*node))
}

/// Outcome of one filter pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterStats {
    /// Subtrees removed because a noise rule matched their root.
    pub noise_removed: usize,
    /// Empty `div`/`span` wrappers removed.
    pub empty_removed: usize,
}

/// Remove every noise subtree below `root`, then every empty `div`/`span`.
///
/// `root` itself is never removed, and nothing inside `<pre>`/`<code>` is
/// touched. Running the filter on its own output
/// removes nothing.
pub fn filter(root: &Selection) -> FilterStats {
    let mut stats = FilterStats::default();
    for child in dom::element_children(root) {
        remove_noise(&child, &mut stats);
    }
    for child in dom::element_children(root) {
        remove_empty_wrappers(&child, &mut stats);
    }
    tracing::debug!(
        noise_removed = stats.noise_removed,
        empty_removed = stats.empty_removed,
        "noise filter pass"
    );
    stats
}

fn remove_noise(sel: &Selection, stats: &mut FilterStats) {
    // highlighter spans (`hljs-comment`, `token comment`) are code, not chrome
    if dom::is_one_of_tags(sel, CODE_TAGS) {
        return;
    }
    if is_noise(sel) {
        dom::remove(sel);
        stats.noise_removed += 1;
        return;
    }
    for child in dom::element_children(sel) {
        remove_noise(&child, stats);
    }
}

// Post-order so that a wrapper holding only empty wrappers goes in the same pass.
fn remove_empty_wrappers(sel: &Selection, stats: &mut FilterStats) {
    if dom::is_one_of_tags(sel, CODE_TAGS) {
        return;
    }
    for child in dom::element_children(sel) {
        remove_empty_wrappers(&child, stats);
    }
    // whitespace-only spans separate words, so only truly empty ones go
    if dom::is_one_of_tags(sel, &["div", "span"])
        && dom::text_content(sel).is_empty()
        && !sel.select(MEDIA_TAGS).exists()
    {
        dom::remove(sel);
        stats.empty_removed += 1;
    }
}
