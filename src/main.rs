//! Sumi-Scrape main entry point
//!
//! This is the command-line interface for the Sumi-Scrape web retriever.

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use sumi_scrape::config::{load_config_with_hash, Config};
use sumi_scrape::handlers::ArticleMode;
use sumi_scrape::{ScrapeRequest, Scraper, TracingProgress};
use tracing_subscriber::EnvFilter;

/// Sumi-Scrape: resilient single-shot web retrieval
///
/// Fetches one or more URLs and prints their content, either raw or reduced
/// to plaintext. Wikipedia and GitHub URLs are re-targeted to their APIs
/// unless --no-redirect is given.
#[derive(Parser, Debug)]
#[command(name = "sumi-scrape")]
#[command(version = "1.0.0")]
#[command(about = "Resilient single-shot web retrieval", long_about = None)]
struct Cli {
    /// URLs to fetch (article titles or URLs with --articles)
    #[arg(value_name = "TARGET", required = true)]
    targets: Vec<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Return bodies untransformed instead of plaintext
    #[arg(long)]
    raw: bool,

    /// Print a JSON array of {url, content} records
    #[arg(long)]
    structured: bool,

    /// Fetch the literal URLs, bypassing site handlers
    #[arg(long)]
    no_redirect: bool,

    /// Treat targets as Wikipedia article titles or URLs
    #[arg(long, conflicts_with_all = ["structured", "no_redirect"])]
    articles: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            Config::default()
        }
    };

    let mut scraper = Scraper::new(config).context("Invalid configuration")?;
    if cli.verbose > 0 {
        scraper = scraper.with_progress(Arc::new(TracingProgress));
    }

    let result = run(&cli, &scraper).await;
    scraper.close();

    let output = result?;
    println!("{}", output);
    Ok(())
}

/// Executes the requested scrape and renders it for stdout
async fn run(cli: &Cli, scraper: &Scraper) -> anyhow::Result<String> {
    if cli.articles {
        let mode = if cli.raw {
            ArticleMode::Page
        } else {
            ArticleMode::Api
        };
        tracing::info!("Fetching {} article(s)", cli.targets.len());
        return scraper
            .fetch_articles(cli.targets.as_slice(), mode)
            .await
            .context("Failed to fetch articles");
    }

    let request = ScrapeRequest::many(cli.targets.iter().cloned())
        .raw(cli.raw)
        .redirect(!cli.no_redirect)
        .structured(cli.structured);

    tracing::info!(
        "Scraping {} URL(s) with concurrency {}",
        request.urls.len(),
        scraper.config().batch.permits()
    );

    let response = scraper.scrape(&request).await.context("Scrape failed")?;
    if cli.structured {
        response
            .to_json()
            .context("Failed to serialize structured output")
    } else {
        Ok(response.to_string())
    }
}

/// Sets up logging based on verbosity level
///
/// Logs go to stderr so that stdout carries only scraped content.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_scrape=info,warn"),
            1 => EnvFilter::new("sumi_scrape=debug,info"),
            2 => EnvFilter::new("sumi_scrape=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}
