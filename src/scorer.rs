//! Heuristic Content Scoring
//!
//! Ranks `article`, `main`, `section` and `div` elements by how much they
//! look like an article body and picks one winner. Used when no profile
//! selector produced a container.
//!
//! ```text
//! score = text_len
//!       + paragraph_bonus * #p
//!       + heading_bonus   * #h1..h6
//!       - link_density_penalty * link_density * text_len
//!       - noise_penalty             (class/id looks like chrome)
//!       + semantic_bonus            (article, main)
//! ```
//!
//! Text inside noise subtrees does not count, so a page wrapper cannot win
//! by carrying the sidebar's text on top of the article's. Code is never
//! noise, whatever its highlighter classes say.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::dom::{self, Document, NodeRef, Selection};
use crate::noise;
use crate::options::Options;
use crate::patterns::SCORER_NOISE_TOKEN;

/// Elements eligible as the content root.
pub const CANDIDATE_SELECTOR: &str = "article, main, section, div";

const HEADING_TAGS: &[&str] = &["h1", "h2", "h3", "h4", "h5", "h6"];

/// Which path produced the content root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// A selector from the named site profile matched.
    Profile(&'static str),
    /// The heuristic scorer picked the winner.
    Heuristic,
    /// Nothing was found; the run is degraded.
    None,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Profile(name) => write!(f, "profile:{name}"),
            Self::Heuristic => f.write_str("heuristic"),
            Self::None => f.write_str("none"),
        }
    }
}

impl Serialize for Strategy {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// A scored element that may become the content root.
#[derive(Clone, Copy)]
pub struct ContentCandidate<'a> {
    pub node: NodeRef<'a>,
    pub score: f64,
    /// Visible characters, noise subtrees excluded.
    pub text_length: usize,
    pub depth: usize,
    pub strategy: Strategy,
}

impl<'a> ContentCandidate<'a> {
    /// The candidate as a selection for further DOM work.
    #[must_use]
    pub fn selection(&self) -> Selection<'a> {
        Selection::from(self.node)
    }
}

impl fmt::Debug for ContentCandidate<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContentCandidate")
            .field("tag", &dom::node_tag(&self.node))
            .field("score", &self.score)
            .field("text_length", &self.text_length)
            .field("depth", &self.depth)
            .field("strategy", &self.strategy)
            .finish()
    }
}

/// Raw measurements of one subtree.
#[derive(Debug, Default)]
struct Measure {
    text: String,
    link_text: String,
    paragraphs: usize,
    headings: usize,
}

fn measure(node: &NodeRef, in_link: bool, in_code: bool, m: &mut Measure) {
    for child in node.children() {
        if child.is_text() {
            let text = child.text();
            m.text.push_str(&text);
            m.text.push(' ');
            if in_link {
                m.link_text.push_str(&text);
                m.link_text.push(' ');
            }
            continue;
        }
        let Some(tag) = dom::node_tag(&child) else {
            continue;
        };
        let code = in_code || noise::CODE_TAGS.contains(&tag.as_str());
        if dom::NON_CONTENT_TAGS.contains(&tag.as_str()) || (!code && noise::is_noise_node(&child)) {
            continue;
        }
        if tag == "p" {
            m.paragraphs += 1;
        } else if HEADING_TAGS.contains(&tag.as_str()) {
            m.headings += 1;
        }
        measure(&child, in_link || tag == "a", code, m);
    }
}

/// Whether the element's own class/id marks it as page chrome.
fn looks_like_noise(sel: &Selection) -> bool {
    dom::class_id_tokens(sel)
        .iter()
        .any(|token| SCORER_NOISE_TOKEN.is_match(token))
        || noise::is_noise(sel)
}

/// Score one element. Returns `(score, text_length)`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score_node(sel: &Selection, options: &Options) -> (f64, usize) {
    let mut m = Measure::default();
    for node in sel.nodes() {
        measure(node, false, false, &mut m);
    }

    let text_len = dom::collapse_whitespace(&m.text).chars().count();
    let link_len = dom::collapse_whitespace(&m.link_text).chars().count();
    let link_density = if text_len == 0 {
        0.0
    } else {
        link_len as f64 / text_len as f64
    };

    let mut score = text_len as f64
        + options.paragraph_bonus * m.paragraphs as f64
        + options.heading_bonus * m.headings as f64
        - options.link_density_penalty * link_density * text_len as f64;

    if looks_like_noise(sel) {
        score -= options.noise_penalty;
    }
    if dom::is_one_of_tags(sel, &["article", "main"]) {
        score += options.semantic_bonus;
    }

    (score, text_len)
}

/// Every candidate that clears both thresholds, in document order.
#[must_use]
pub fn score_candidates<'a>(doc: &'a Document, options: &Options) -> Vec<ContentCandidate<'a>> {
    doc.select(CANDIDATE_SELECTOR)
        .nodes()
        .iter()
        .filter_map(|node| {
            let sel = Selection::from(*node);
            let (score, text_length) = score_node(&sel, options);
            (text_length >= options.min_text_length && score >= options.min_heuristic_score).then(
                || ContentCandidate {
                    node: *node,
                    score,
                    text_length,
                    depth: dom::depth(&sel),
                    strategy: Strategy::Heuristic,
                },
            )
        })
        .collect()
}

/// Highest scoring candidate. Every candidate within
/// [`Options::tie_tolerance`] of the top score counts as tied; ties go to the
/// shallower node, then to the earlier one in document order.
#[must_use]
pub fn best_candidate<'a>(doc: &'a Document, options: &Options) -> Option<ContentCandidate<'a>> {
    let candidates = score_candidates(doc, options);
    let top = candidates.iter().map(|c| c.score).max_by(f64::total_cmp)?;
    let floor = top - options.tie_tolerance.max(0.0);

    // min_by_key keeps the first of equal depths
    let best = candidates
        .into_iter()
        .filter(|c| c.score >= floor)
        .min_by_key(|c| c.depth);

    if let Some(winner) = &best {
        tracing::debug!(
            tag = ?dom::node_tag(&winner.node),
            score = winner.score,
            text_length = winner.text_length,
            depth = winner.depth,
            "heuristic winner"
        );
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lorem(words: usize) -> String {
        (0..words).map(|i| format!("word{i}")).collect::<Vec<_>>().join(" ")
    }

    fn paragraphs(n: usize, words: usize) -> String {
        (0..n).map(|_| format!("<p>{}</p>", lorem(words))).collect()
    }

    #[test]
    fn strategy_display() {
        assert_eq!(Strategy::Profile("csdn").to_string(), "profile:csdn");
        assert_eq!(Strategy::Heuristic.to_string(), "heuristic");
        assert_eq!(Strategy::None.to_string(), "none");
    }

    #[test]
    fn article_beats_link_heavy_sidebar() {
        let links: String = (0..40).map(|i| format!("<a href=\"/p{i}\">Another post title {i}</a>")).collect();
        let html = format!(
            "<html><body><div class=\"list\">{links}</div><article>{}</article></body></html>",
            paragraphs(5, 30)
        );
        let doc = dom::parse(&html);
        let best = best_candidate(&doc, &Options::default());

        let best = match best {
            Some(c) => c,
            None => panic!("expected a candidate"),
        };
        assert_eq!(dom::node_tag(&best.node).as_deref(), Some("article"));
        assert_eq!(best.strategy, Strategy::Heuristic);
    }

    #[test]
    fn noise_subtree_text_is_not_counted() {
        let html = format!(
            "<div id=\"wrap\"><div class=\"sidebar\">{}</div><p>{}</p></div>",
            lorem(100),
            lorem(10)
        );
        let doc = dom::parse(&html);
        let (_, text_len) = score_node(&doc.select("#wrap"), &Options::default());

        assert_eq!(text_len, lorem(10).chars().count());
    }

    #[test]
    fn noise_class_is_penalized() {
        let body = paragraphs(3, 20);
        let doc = dom::parse(&format!(
            "<div id=\"a\" class=\"content\">{body}</div><div id=\"b\" class=\"comments\">{body}</div>"
        ));
        let opts = Options::default();
        let (plain, _) = score_node(&doc.select("#a"), &opts);
        let (noisy, _) = score_node(&doc.select("#b"), &opts);

        assert!((plain - noisy - opts.noise_penalty).abs() < 1e-9);
    }

    #[test]
    fn ties_go_to_the_shallower_node() {
        let html = format!(
            "<html><body><div id=\"outer\"><div id=\"inner\">{}</div></div></body></html>",
            paragraphs(4, 25)
        );
        let doc = dom::parse(&html);
        let best = best_candidate(&doc, &Options::default());

        let best = match best {
            Some(c) => c,
            None => panic!("expected a candidate"),
        };
        assert_eq!(best.selection().attr("id").map(|s| s.to_string()), Some("outer".into()));
    }

    #[test]
    fn near_ties_go_to_the_shallower_node() {
        // main earns the semantic bonus, so the wrapper trails it by exactly that much
        let html = format!(
            "<html><body><div id=\"outer\"><main id=\"inner\">{}</main></div></body></html>",
            paragraphs(4, 25)
        );
        let doc = dom::parse(&html);
        let id_of = |opts: &Options| {
            best_candidate(&doc, opts).and_then(|c| c.selection().attr("id")).map(|s| s.to_string())
        };

        let strict = Options { tie_tolerance: 0.0, ..Options::default() };
        assert_eq!(id_of(&strict), Some("inner".into()));

        let lenient = Options { tie_tolerance: strict.semantic_bonus + 1.0, ..Options::default() };
        assert_eq!(id_of(&lenient), Some("outer".into()));
    }

    #[test]
    fn highlighter_spans_count_as_code_text() {
        let code = "<pre><code><span class=\"hljs-comment\">// twelve chars</span></code></pre>";
        let doc = dom::parse(&format!("<div id=\"post\">{code}</div>"));
        let (_, text_len) = score_node(&doc.select("#post"), &Options::default());

        assert_eq!(text_len, "// twelve chars".chars().count());
    }

    #[test]
    fn nothing_clears_threshold_on_thin_page() {
        let doc = dom::parse("<html><body><div><p>Short note.</p></div></body></html>");
        assert!(best_candidate(&doc, &Options::default()).is_none());
    }

    #[test]
    fn scoring_is_deterministic() {
        let html = format!(
            "<main>{}</main><section>{}</section><div class=\"x\">{}</div>",
            paragraphs(3, 40),
            paragraphs(4, 30),
            paragraphs(2, 60)
        );
        let opts = Options::default();
        let first_doc = dom::parse(&html);
        let second_doc = dom::parse(&html);

        let first: Vec<_> = score_candidates(&first_doc, &opts).iter().map(|c| (c.score, c.depth)).collect();
        let second: Vec<_> = score_candidates(&second_doc, &opts).iter().map(|c| (c.score, c.depth)).collect();
        assert_eq!(first, second);

        let a = best_candidate(&first_doc, &opts).map(|c| dom::outer_html(&c.selection()).to_string());
        let b = best_candidate(&second_doc, &opts).map(|c| dom::outer_html(&c.selection()).to_string());
        assert_eq!(a, b);
    }
}
