//! blog2md - save a blog article as clean HTML plus a Markdown draft.
//!
//! Output goes to `<output-dir>/<slug>/<slug>.html` and `<slug>.md`, with
//! images under `<output-dir>/<slug>/assets/`. Logs go to stderr and honour
//! `RUST_LOG`.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use rs_blog2md::{FsWriter, HttpFetcher, Options, Pipeline, RunReport};

/// Fetch a blog page and save HTML + Markdown drafts.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Full URL of the blog article
    url: String,

    /// Root directory for the per-article output folder
    #[arg(short, long, default_value = "example")]
    output_dir: PathBuf,

    /// HTML output path (default: <output-dir>/<slug>/<slug>.html)
    #[arg(long)]
    html_out: Option<PathBuf>,

    /// Markdown output path (default: <output-dir>/<slug>/<slug>.md)
    #[arg(long)]
    md_out: Option<PathBuf>,

    /// Request timeout in seconds, per request
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Override the default User-Agent
    #[arg(long)]
    user_agent: Option<String>,

    /// TOML file with extraction and download options
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Keep remote image URLs instead of downloading images
    #[arg(long)]
    no_assets: bool,

    /// Maximum concurrent image downloads
    #[arg(long)]
    concurrency: Option<usize>,

    /// Print the run report as JSON on stdout
    #[arg(long)]
    json: bool,
}

impl Args {
    fn options(&self) -> rs_blog2md::Result<Options> {
        let mut options = match &self.config {
            Some(path) => Options::from_toml_file(path)?,
            None => Options::default(),
        };
        if let Some(timeout) = self.timeout {
            options.timeout_secs = timeout;
        }
        if let Some(user_agent) = &self.user_agent {
            options.user_agent.clone_from(user_agent);
        }
        if let Some(concurrency) = self.concurrency {
            options.asset_concurrency = concurrency;
        }
        if self.no_assets {
            options.localize_assets = false;
        }
        options.validate()?;
        Ok(options)
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn print_report(report: &RunReport, json: bool) {
    if json {
        match report.to_json() {
            Ok(text) => println!("{text}"),
            Err(err) => tracing::error!(error = %err, "could not serialize report"),
        }
        return;
    }
    println!("[info] Extraction method: {}", report.strategy);
    println!("[info] Approximate characters: {}", report.char_count);
    if report.assets_fetched + report.assets_failed > 0 {
        println!(
            "[info] Images: {} saved, {} left remote",
            report.assets_fetched, report.assets_failed
        );
    }
    for path in &report.written {
        println!("[info] Wrote {}", path.display());
    }
    for err in &report.write_errors {
        eprintln!("Error: {err}");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let args = Args::parse();

    let options = match args.options() {
        Ok(options) => options,
        Err(err) => {
            eprintln!("Error: {err}");
            return ExitCode::FAILURE;
        }
    };

    let mut pipeline = Pipeline::new(
        Arc::new(HttpFetcher::new()),
        Arc::new(FsWriter::new(&args.output_dir)),
        options,
    )
    .with_output_paths(args.html_out.clone(), args.md_out.clone());

    match pipeline.run(&args.url).await {
        Ok(conversion) => {
            print_report(&conversion.report, args.json);
            if conversion.report.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            }
        }
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
