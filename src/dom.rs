//! DOM Operations Adapter
//!
//! Typed accessors over `dom_query` used by every extraction stage: tag
//! name, class/id token set, visible text, element children and depth.
//! Stages never read attributes ad hoc; they go through these helpers.

pub use dom_query::{Document, NodeRef, Selection};

pub use tendril::StrTendril;

/// Tags whose text is never visible content.
pub const NON_CONTENT_TAGS: &[&str] = &["script", "style", "noscript", "template"];

// === Attribute Operations ===

/// Get element ID attribute
#[inline]
#[must_use]
pub fn id(sel: &Selection) -> Option<String> {
    sel.attr("id").map(|s| s.to_string())
}

/// Get element class attribute
#[inline]
#[must_use]
pub fn class_name(sel: &Selection) -> Option<String> {
    sel.attr("class").map(|s| s.to_string())
}

/// Get any attribute value, trimmed, ignoring empty values
#[must_use]
pub fn non_empty_attribute(sel: &Selection, name: &str) -> Option<String> {
    sel.attr(name)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Set an attribute value
#[inline]
pub fn set_attribute(sel: &Selection, name: &str, value: &str) {
    sel.set_attr(name, value);
}

/// Remove an attribute
#[inline]
pub fn remove_attribute(sel: &Selection, name: &str) {
    sel.remove_attr(name);
}

/// Lowercased class tokens followed by the lowercased id, if any.
///
/// `<div id="Main" class="post  Body">` yields `["post", "body", "main"]`.
#[must_use]
pub fn class_id_tokens(sel: &Selection) -> Vec<String> {
    let mut tokens: Vec<String> = class_name(sel)
        .unwrap_or_default()
        .split_whitespace()
        .map(str::to_ascii_lowercase)
        .collect();
    if let Some(id) = id(sel) {
        let id = id.trim().to_ascii_lowercase();
        if !id.is_empty() {
            tokens.push(id);
        }
    }
    tokens
}

// === Tag/Node Information ===

/// Get tag name (lowercase)
#[must_use]
pub fn tag_name(sel: &Selection) -> Option<String> {
    sel.nodes().first().and_then(node_tag)
}

/// Tag name of a raw node, lowercased; `None` for non-elements.
#[must_use]
pub fn node_tag(node: &NodeRef) -> Option<String> {
    if !node.is_element() {
        return None;
    }
    node.node_name().map(|t| t.to_ascii_lowercase())
}

/// Check if element is one of the specified tags
#[must_use]
pub fn is_one_of_tags(sel: &Selection, tags: &[&str]) -> bool {
    tag_name(sel).is_some_and(|t| tags.contains(&t.as_str()))
}

/// Number of element ancestors between the node and the document root.
///
/// `<html>` has depth 0, `<body>` depth 1.
#[must_use]
pub fn depth(sel: &Selection) -> usize {
    let Some(node) = sel.nodes().first() else {
        return 0;
    };
    let mut depth = 0;
    let mut current = node.parent();
    while let Some(parent) = current {
        if parent.is_element() {
            depth += 1;
        }
        current = parent.parent();
    }
    depth
}

// === Text Content ===

/// Get all text content of node and descendants
#[inline]
#[must_use]
pub fn text_content(sel: &Selection) -> StrTendril {
    sel.text()
}

/// Text with every whitespace run collapsed to one space and both ends
/// trimmed.
#[must_use]
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Visible text of a subtree, whitespace-collapsed, skipping
/// [`NON_CONTENT_TAGS`].
#[must_use]
pub fn visible_text(sel: &Selection) -> String {
    let mut out = String::new();
    for node in sel.nodes() {
        collect_text(node, &mut out, &|_| false);
    }
    collapse_whitespace(&out)
}

/// Character count of [`visible_text`].
#[must_use]
pub fn visible_text_len(sel: &Selection) -> usize {
    visible_text(sel).chars().count()
}

/// Append the text below `node` to `out`, not descending into
/// non-content tags or into elements for which `skip` returns true.
pub fn collect_text(node: &NodeRef, out: &mut String, skip: &dyn Fn(&NodeRef) -> bool) {
    for child in node.children() {
        if child.is_text() {
            out.push_str(&child.text());
            out.push(' ');
        } else if child.is_element() {
            let is_hidden = node_tag(&child).is_some_and(|t| NON_CONTENT_TAGS.contains(&t.as_str()));
            if !is_hidden && !skip(&child) {
                collect_text(&child, out, skip);
            }
        }
    }
}

/// Get inner HTML content
#[inline]
#[must_use]
pub fn inner_html(sel: &Selection) -> StrTendril {
    sel.inner_html()
}

/// Get outer HTML content
#[inline]
#[must_use]
pub fn outer_html(sel: &Selection) -> StrTendril {
    sel.html()
}

// === Tree Navigation ===

/// Direct element children as individual selections, in document order.
#[must_use]
pub fn element_children<'a>(sel: &Selection<'a>) -> Vec<Selection<'a>> {
    sel.nodes()
        .first()
        .map(|node| {
            node.children()
                .into_iter()
                .filter(NodeRef::is_element)
                .map(Selection::from)
                .collect()
        })
        .unwrap_or_default()
}

// === Tree Manipulation ===

/// Remove elements from tree
#[inline]
pub fn remove(sel: &Selection) {
    sel.remove();
}

/// Replace each selected element with the given markup.
#[inline]
pub fn replace_with_html(sel: &Selection, html: &str) {
    sel.replace_with_html(html);
}

/// Remove every element matching `selector` below (and excluding) `root`.
///
/// Returns the number of removed elements.
pub fn remove_matching(root: &Selection, selector: &str) -> usize {
    let found = root.select(selector);
    let count = found.length();
    found.remove();
    count
}

// === Parsing ===

/// Parse HTML string into document
#[inline]
#[must_use]
pub fn parse(html: &str) -> Document {
    Document::from(html)
}

/// Parse an HTML fragment inside a `<body>` wrapper.
#[must_use]
pub fn parse_fragment(html: &str) -> Document {
    Document::from(format!("<html><body>{html}</body></html>"))
}
