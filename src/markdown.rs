//! Markdown rendering.
//!
//! The pipeline renders through the [`MarkdownRenderer`] trait. The default
//! [`QuickMarkdown`] wraps `quick_html2md` with links, images and tables
//! enabled. Renderers must leave `href`/`src` values untouched, so no
//! escaping pass runs over the output.
//!
//! Code blocks never go through the converter: each `<pre>` is swapped for a
//! placeholder paragraph and comes back as a fenced block tagged with the
//! `language-X` class of its `<code>`.

use quick_html2md::{html_to_markdown_with_options, MarkdownOptions};

use crate::code_blocks;
use crate::dom;

const FENCE_MARKER: &str = "BLOGMDFENCE";

/// Converts cleaned article HTML to Markdown.
pub trait MarkdownRenderer: Send + Sync {
    fn render(&self, html: &str) -> String;
}

/// `quick_html2md`-backed renderer.
#[derive(Debug, Clone, Copy)]
pub struct QuickMarkdown {
    pub include_links: bool,
    pub include_images: bool,
    pub preserve_tables: bool,
}

impl Default for QuickMarkdown {
    fn default() -> Self {
        Self {
            include_links: true,
            include_images: true,
            preserve_tables: true,
        }
    }
}

impl MarkdownRenderer for QuickMarkdown {
    fn render(&self, html: &str) -> String {
        let options = MarkdownOptions::new()
            .include_links(self.include_links)
            .include_images(self.include_images)
            .preserve_tables(self.preserve_tables);
        let (html, fences) = take_code_blocks(html);
        let mut markdown = html_to_markdown_with_options(&html, &options);
        for (i, fence) in fences.iter().enumerate() {
            markdown = markdown.replace(&placeholder(i), &format!("\n{fence}\n"));
        }
        tidy(&markdown)
    }
}

fn placeholder(index: usize) -> String {
    format!("{FENCE_MARKER}{index}X")
}

/// Replace every `<pre>` with a placeholder paragraph. Returns the new
/// markup and the fenced block for each placeholder, by index.
fn take_code_blocks(html: &str) -> (String, Vec<String>) {
    if !html.contains("<pre") {
        return (html.to_string(), Vec::new());
    }
    let doc = dom::parse_fragment(html);
    let mut fences = Vec::new();

    for pre in doc.select("pre").iter() {
        let code = pre.select("code");
        let (language, text) = if code.exists() {
            let code = code.first();
            (code_blocks::language_class(&code), code_blocks::code_text(&code))
        } else {
            (code_blocks::language_class(&pre), code_blocks::code_text(&pre))
        };
        dom::replace_with_html(&pre, &format!("<p>{}</p>", placeholder(fences.len())));
        fences.push(fenced(&code_blocks::clean_code_text(&text), language.as_deref()));
    }

    (dom::inner_html(&doc.select("body")).to_string(), fences)
}

/// A fenced block whose fence is longer than any backtick run in `code`.
#[must_use]
pub fn fenced(code: &str, language: Option<&str>) -> String {
    let longest_run = code
        .split(|c: char| c != '`')
        .map(str::len)
        .max()
        .unwrap_or(0);
    let fence = "`".repeat(longest_run.max(2) + 1);
    format!("{fence}{}\n{code}\n{fence}", language.unwrap_or(""))
}

/// Strip trailing spaces outside fenced code and collapse runs of blank
/// lines to one.
#[must_use]
pub fn tidy(markdown: &str) -> String {
    let mut out = String::with_capacity(markdown.len());
    // backtick count of the open fence
    let mut open_fence: Option<usize> = None;
    let mut blank_run = 0;

    for line in markdown.lines() {
        let ticks = line.trim_start().chars().take_while(|&c| c == '`').count();
        match open_fence {
            Some(open) if ticks >= open && line.trim().chars().all(|c| c == '`') => open_fence = None,
            Some(_) => {
                out.push_str(line);
                out.push('\n');
                continue;
            }
            None if ticks >= 3 => open_fence = Some(ticks),
            None => {}
        }

        let line = line.trim_end();
        if line.is_empty() {
            blank_run += 1;
            if blank_run > 1 || out.is_empty() {
                continue;
            }
        } else {
            blank_run = 0;
        }
        out.push_str(line);
        out.push('\n');
    }

    let trimmed = out.trim_end_matches('\n').len();
    out.truncate(trimmed);
    if !out.is_empty() {
        out.push('\n');
    }
    out
}

/// Prefix the rendered body with a level-one title heading.
#[must_use]
pub fn with_title(title: Option<&str>, body: &str) -> String {
    match title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(title) => format!("# {title}\n\n{body}"),
        None => body.to_string(),
    }
}
