use anyhow::{Context, Result};
use clap::Parser;
use futures::stream::{self, StreamExt};
use harvest::api::CatalogClient;
use harvest::config::Config;
use harvest::fetch::build_client;
use harvest::scrape::classify_fetch_kind;
use harvest::worker::{harvest_url, IngestionWorker};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "harvest",
    about = "Ingest RSS/Atom feeds and news pages into the article catalog"
)]
struct Args {
    /// Config file (default: ~/.config/harvest/config.toml)
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fetch and print normalized articles as JSON without calling the API
    #[arg(long)]
    dry_run: bool,

    /// Feed or page URLs; replaces the configured list
    #[arg(value_name = "URL")]
    urls: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config_path = match args.config {
        Some(path) => path,
        None => Config::default_path()?,
    };
    let mut config = Config::load(&config_path)
        .with_context(|| format!("Failed to load config from {}", config_path.display()))?;
    config.apply_env();
    if !args.urls.is_empty() {
        config.feed_urls = args.urls;
    }
    tracing::debug!(config = ?config, "Effective configuration");

    let http = build_client(&config.user_agent).context("Failed to build HTTP client")?;

    if args.dry_run {
        return dry_run(&http, &config).await;
    }

    config
        .validate_for_ingestion()
        .context("Configuration incomplete")?;

    let catalog = CatalogClient::new(http.clone(), config.catalog_settings());
    let worker = IngestionWorker::new(
        catalog,
        http,
        config.feed_urls.clone(),
        config.scrape_options(),
    );

    let summary = worker.run().await;
    println!(
        "{}",
        serde_json::to_string_pretty(&summary).context("Failed to serialize run summary")?
    );

    Ok(if summary.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Harvests every configured URL and prints the records, one JSON array.
async fn dry_run(http: &reqwest::Client, config: &Config) -> Result<ExitCode> {
    if config.feed_urls.is_empty() {
        anyhow::bail!("No URLs given: pass them as arguments or set RSS_FEED_URLS");
    }

    let options = config.scrape_options();
    let batches: Vec<_> = stream::iter(&config.feed_urls)
        .map(|url| harvest_url(http, url, classify_fetch_kind(url), &options))
        .buffered(4)
        .collect()
        .await;
    let articles: Vec<_> = batches.into_iter().flatten().collect();

    tracing::info!(count = articles.len(), "Dry run complete");
    println!(
        "{}",
        serde_json::to_string_pretty(&articles).context("Failed to serialize articles")?
    );
    Ok(ExitCode::SUCCESS)
}
