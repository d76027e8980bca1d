//! Code Block Normalization
//!
//! Collapses syntax-highlighter markup (Hexo `figure.highlight` tables,
//! Pygments/Rouge `div.highlight`, `.codeblock` widgets) into plain
//! `<pre><code class="language-X">` so the Markdown renderer emits fenced
//! blocks with the right language and without line numbers.

use crate::dom::{self, NodeRef, Selection};
use crate::patterns::CODE_LANGUAGE_CLASS;

const WRAPPER_SELECTOR: &str = ".highlight, .codeblock";

/// Normalize every code block below `root`. Returns the number of blocks
/// rewritten. Running it twice yields the same markup.
pub fn normalize(root: &Selection) -> usize {
    let mut count = 0;

    for wrapper in root.select(WRAPPER_SELECTOR).iter() {
        dom::remove_matching(&wrapper, ".gutter");
        let language = detect_language(&wrapper);
        let code = wrapper.select(".code");
        let section = if code.exists() { code.first() } else { wrapper.clone() };
        let text = clean_code_text(&code_text(&section));

        wrapper.set_html(code_block_html(&text, language.as_deref()));
        count += 1;
    }

    for pre in root.select("pre").iter() {
        let code = pre.select("code");
        if code.exists() {
            let code = code.first();
            let text = clean_code_text(&code_text(&code));
            code.set_html(escape_text(&text));
        } else {
            let text = clean_code_text(&code_text(&pre));
            pre.set_html(format!("<code>{}</code>", escape_text(&text)));
        }
        count += 1;
    }

    if count > 0 {
        tracing::debug!(blocks = count, "normalized code blocks");
    }
    count
}

fn code_block_html(text: &str, language: Option<&str>) -> String {
    match language {
        Some(lang) => format!(
            r#"<pre><code class="language-{lang}">{}</code></pre>"#,
            escape_text(text)
        ),
        None => format!("<pre><code>{}</code></pre>", escape_text(text)),
    }
}

/// Language from `language-X`/`lang-X` on the wrapper, its parent or the
/// inner `<code>`, then Hexo's `<figure class="highlight X">` form.
fn detect_language(wrapper: &Selection) -> Option<String> {
    if let Some(lang) = language_class(wrapper) {
        return Some(lang);
    }
    if let Some(parent) = wrapper.nodes().first().and_then(NodeRef::parent) {
        if let Some(lang) = language_class(&Selection::from(parent)) {
            return Some(lang);
        }
    }
    let code = wrapper.select("code");
    if let Some(lang) = code.iter().find_map(|c| language_class(&c)) {
        return Some(lang);
    }

    if dom::is_one_of_tags(wrapper, &["figure"]) {
        return dom::class_id_tokens(wrapper).into_iter().find(|token| {
            token != "highlight"
                && token != "codeblock"
                && token
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '#' | '-' | '_'))
        });
    }
    None
}

/// Lower-cased `X` from a `language-X`/`lang-X` class on the element.
#[must_use]
pub fn language_class(sel: &Selection) -> Option<String> {
    dom::class_name(sel).and_then(|classes| {
        classes.split_whitespace().find_map(|token| {
            CODE_LANGUAGE_CLASS
                .captures(token)
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_ascii_lowercase())
        })
    })
}

/// Raw code text: one line per `.line` element when present, otherwise
/// the subtree text with `<br>` as newline.
#[must_use]
pub fn code_text(section: &Selection) -> String {
    let lines = section.select(".line");
    if lines.exists() {
        return lines
            .iter()
            .map(|line| {
                let mut out = String::new();
                for node in line.nodes() {
                    raw_text(node, &mut out);
                }
                out
            })
            .collect::<Vec<_>>()
            .join("\n");
    }

    let mut out = String::new();
    for node in section.nodes() {
        raw_text(node, &mut out);
    }
    out
}

fn raw_text(node: &NodeRef, out: &mut String) {
    for child in node.children() {
        if child.is_text() {
            out.push_str(&child.text());
        } else if dom::node_tag(&child).as_deref() == Some("br") {
            out.push('\n');
        } else if child.is_element() {
            raw_text(&child, out);
        }
    }
}

/// Strip trailing whitespace per line and blank lines at both ends.
#[must_use]
pub fn clean_code_text(text: &str) -> String {
    text.lines()
        .map(str::trim_end)
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

fn escape_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}
