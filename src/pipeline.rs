//! Conversion pipeline.
//!
//! One page is processed strictly in sequence: fetch, decode, extract,
//! filter, localize images, render Markdown, write. Only a bad URL, an
//! invalid configuration or a failed page fetch abort the run; every later
//! failure degrades the output and is recorded in the [`RunReport`].

use std::path::{Path, PathBuf};
use std::sync::Arc;

use url::Url;

use crate::assets::{AssetLocalizer, AssetStatus};
use crate::code_blocks;
use crate::dom;
use crate::encoding;
use crate::error::Result;
use crate::extractor;
use crate::fetch::Fetcher;
use crate::markdown::{self, MarkdownRenderer, QuickMarkdown};
use crate::noise;
use crate::options::Options;
use crate::profile;
use crate::result::{Document, ExtractionResult, RunReport};
use crate::scorer::Strategy;
use crate::slug::SlugGenerator;
use crate::url_utils;
use crate::writer::Writer;

/// Written in place of the content when nothing could be extracted and the
/// page body is empty as well.
pub const EMPTY_ARTICLE: &str = "<article></article>";

/// Page title: `<title>`, else the first `<h1>`.
#[must_use]
pub fn extract_title(doc: &dom::Document) -> Option<String> {
    let from = |selector: &str| {
        doc.select(selector)
            .nodes()
            .first()
            .map(|node| dom::collapse_whitespace(&node.text()))
            .filter(|t| !t.is_empty())
    };
    from("title").or_else(|| from("h1"))
}

/// The content of one page before image localization.
#[derive(Debug, Clone)]
pub struct Extracted {
    pub document: Document,
    /// `<article>` fragment, noise removed and code blocks normalized.
    pub content_html: String,
    pub char_count: usize,
    pub removed_nodes: usize,
}

impl Extracted {
    /// No content root was found.
    #[must_use]
    pub fn degraded(&self) -> bool {
        self.document.strategy_used == Strategy::None
    }
}

/// The whole `<body>` after noise removal, wrapped in `<article>`.
fn body_fallback(doc: &dom::Document) -> (String, usize, usize) {
    let body = doc.select("body");
    if !body.exists() {
        return (EMPTY_ARTICLE.to_string(), 0, 0);
    }
    let stats = noise::filter(&body);
    code_blocks::normalize(&body);

    let inner = dom::inner_html(&body).trim().to_string();
    let content_html = if inner.is_empty() {
        EMPTY_ARTICLE.to_string()
    } else {
        format!("<article>\n{inner}\n</article>")
    };
    (
        content_html,
        dom::visible_text_len(&body),
        stats.noise_removed + stats.empty_removed,
    )
}

/// Run the pure part of the pipeline on already-decoded HTML.
///
/// Never fails: when no content root is found the noise-filtered `<body>`
/// becomes the content and the slug is a timestamp.
pub fn extract_article(
    raw_html: String,
    url: Option<&Url>,
    options: &Options,
    slugs: &mut SlugGenerator,
) -> Extracted {
    let doc = dom::parse(&raw_html);
    let title = extract_title(&doc);
    let resolved = profile::resolve(url, &doc);
    let source_url = url.map(Url::to_string).unwrap_or_default();

    let (strategy, content_html, char_count, removed_nodes) =
        match extractor::extract(&doc, &resolved, options) {
            Ok(candidate) => {
                let root = candidate.selection();
                let stats = noise::filter(&root);
                code_blocks::normalize(&root);

                let char_count = dom::visible_text_len(&root);
                let outer = dom::outer_html(&root).to_string();
                let content_html = if dom::is_one_of_tags(&root, &["article"]) {
                    outer
                } else {
                    format!("<article>\n{outer}\n</article>")
                };
                (
                    candidate.strategy,
                    content_html,
                    char_count,
                    stats.noise_removed + stats.empty_removed,
                )
            }
            Err(err) => {
                tracing::warn!(url = %source_url, error = %err, "falling back to the page body");
                let (content_html, char_count, removed_nodes) = body_fallback(&doc);
                (Strategy::None, content_html, char_count, removed_nodes)
            }
        };

    let slug = if strategy == Strategy::None {
        slugs.fallback()
    } else {
        slugs.generate(title.as_deref(), url)
    };

    Extracted {
        document: Document {
            source_url,
            raw_html,
            title,
            slug,
            strategy_used: strategy,
        },
        content_html,
        char_count,
        removed_nodes,
    }
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct Conversion {
    pub document: Document,
    pub result: ExtractionResult,
    pub report: RunReport,
}

/// Fetches, converts and writes pages.
pub struct Pipeline {
    fetcher: Arc<dyn Fetcher>,
    writer: Arc<dyn Writer>,
    renderer: Box<dyn MarkdownRenderer>,
    options: Options,
    slugs: SlugGenerator,
    html_out: Option<PathBuf>,
    md_out: Option<PathBuf>,
}

impl Pipeline {
    #[must_use]
    pub fn new(fetcher: Arc<dyn Fetcher>, writer: Arc<dyn Writer>, options: Options) -> Self {
        Self {
            fetcher,
            writer,
            renderer: Box::new(QuickMarkdown::default()),
            slugs: SlugGenerator::new(options.max_slug_length),
            options,
            html_out: None,
            md_out: None,
        }
    }

    #[must_use]
    pub fn with_renderer(mut self, renderer: impl MarkdownRenderer + 'static) -> Self {
        self.renderer = Box::new(renderer);
        self
    }

    /// Override where the HTML and Markdown documents go. Paths are handed
    /// to the writer as given. Images are stored next to the HTML output.
    #[must_use]
    pub fn with_output_paths(mut self, html_out: Option<PathBuf>, md_out: Option<PathBuf>) -> Self {
        self.html_out = html_out;
        self.md_out = md_out;
        self
    }

    #[must_use]
    pub fn options(&self) -> &Options {
        &self.options
    }

    fn output_paths(&self, slug: &str) -> (PathBuf, PathBuf) {
        let doc_dir = Path::new(slug);
        let html = self
            .html_out
            .clone()
            .unwrap_or_else(|| doc_dir.join(format!("{slug}.html")));
        let md = self
            .md_out
            .clone()
            .unwrap_or_else(|| doc_dir.join(format!("{slug}.md")));
        (html, md)
    }

    /// Convert one page.
    ///
    /// Returns `Err` only for an invalid URL or options, or when the page
    /// itself cannot be fetched; nothing is written in those cases.
    pub async fn run(&mut self, url: &str) -> Result<Conversion> {
        let url = url_utils::parse_page_url(url)?;
        self.options.validate()?;

        let page = self
            .fetcher
            .fetch(&url, self.options.timeout(), &self.options.user_agent)
            .await?;
        let raw_html = encoding::decode_html(&page.bytes, page.content_type.as_deref());

        let extracted = extract_article(raw_html, Some(&page.final_url), &self.options, &mut self.slugs);
        let mut document = extracted.document;
        document.source_url = url.to_string();
        tracing::info!(
            url = %document.source_url,
            strategy = %document.strategy_used,
            chars = extracted.char_count,
            "extracted content"
        );

        let (html_path, md_path) = self.output_paths(&document.slug);
        let doc_dir = html_path.parent().map(Path::to_path_buf).unwrap_or_default();

        let localized = AssetLocalizer::new(Arc::clone(&self.fetcher), &self.options)
            .localize(
                &extracted.content_html,
                Some(&page.final_url),
                self.writer.as_ref(),
                &doc_dir,
            )
            .await;
        if !localized.assets.is_empty() {
            tracing::info!(
                fetched = localized.fetched(),
                failed = localized.failed(),
                "localized images"
            );
        }

        let body = self.renderer.render(&localized.html);
        let markdown_text = markdown::with_title(document.title.as_deref(), &body);

        let mut written = Vec::new();
        let mut write_errors = Vec::new();
        for (path, bytes) in [
            (&html_path, localized.html.as_bytes()),
            (&md_path, markdown_text.as_bytes()),
        ] {
            match self.writer.write(path, bytes) {
                Ok(full) => {
                    tracing::info!(path = %full.display(), "wrote output");
                    written.push(full);
                }
                Err(err) => {
                    tracing::error!(error = %err, "could not write output");
                    write_errors.push(err.to_string());
                }
            }
        }
        written.extend(
            localized
                .assets
                .iter()
                .filter(|a| a.status == AssetStatus::Fetched)
                .map(|a| doc_dir.join(&a.local_relative_path)),
        );

        let result = ExtractionResult {
            cleaned_html: localized.html,
            markdown_text,
            char_count: extracted.char_count,
            assets: localized.assets,
        };
        let report = RunReport {
            source_url: document.source_url.clone(),
            slug: document.slug.clone(),
            title: document.title.clone(),
            strategy: document.strategy_used,
            char_count: result.char_count,
            degraded: document.strategy_used == Strategy::None,
            removed_nodes: extracted.removed_nodes,
            assets_fetched: result.assets_with(AssetStatus::Fetched),
            assets_failed: result.assets_with(AssetStatus::Failed),
            written,
            write_errors,
        };

        Ok(Conversion {
            document,
            result,
            report,
        })
    }
}
