//! Otomoto Harvester main entry point
//!
//! This is the command-line interface for the listing harvester.

use anyhow::Context;
use clap::Parser;
use otomoto_harvester::config::{load_config_with_hash, validate, Config};
use otomoto_harvester::crawler::run_harvest;
use otomoto_harvester::output::print_statistics;
use otomoto_harvester::url::search_page_url;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Otomoto Harvester: a polite listing harvester
///
/// Walks the passenger-car search results newest first, fetches every
/// listing found and writes normalized records as CSV batches to a blob
/// container or a local backup directory.
#[derive(Parser, Debug)]
#[command(name = "otomoto-harvester")]
#[command(version)]
#[command(about = "A polite classifieds listing harvester", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (defaults apply when omitted)
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// First search results page to fetch
    #[arg(long, value_name = "PAGE")]
    start_page: Option<u32>,

    /// Number of search pages to process (unbounded when omitted)
    #[arg(long, value_name = "COUNT")]
    pages: Option<u32>,

    /// Directory for batches that are not uploaded
    #[arg(long, value_name = "DIR")]
    backup_dir: Option<String>,

    /// Records per CSV batch
    #[arg(long, value_name = "N")]
    batch_size: Option<usize>,

    /// Blob container URL (with SAS token) for batch uploads
    #[arg(long, env = "OTOMOTO_BLOB_CONTAINER_URL", value_name = "URL", hide_env_values = true)]
    blob_container_url: Option<String>,

    /// Validate config and show what would be harvested without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Applies command-line overrides on top of the file configuration
    fn apply_overrides(&self, config: &mut Config) {
        if let Some(page) = self.start_page {
            config.crawl.start_page = page;
        }
        if let Some(pages) = self.pages {
            config.crawl.page_limit = Some(pages);
        }
        if let Some(dir) = &self.backup_dir {
            config.output.backup_dir = dir.clone();
        }
        if let Some(size) = self.batch_size {
            config.output.batch_size = size;
        }
        if let Some(url) = self.blob_container_url.as_deref().map(str::trim) {
            // An empty variable means "no container"
            config.output.blob_container_url = (!url.is_empty()).then(|| url.to_string());
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env before clap reads OTOMOTO_BLOB_CONTAINER_URL
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using defaults");
            Config::default()
        }
    };

    cli.apply_overrides(&mut config);
    validate(&config).context("invalid configuration after command-line overrides")?;

    if cli.dry_run {
        return handle_dry_run(&config);
    }

    handle_harvest(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("otomoto_harvester=info,warn"),
            1 => EnvFilter::new("otomoto_harvester=debug,info"),
            2 => EnvFilter::new("otomoto_harvester=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) -> anyhow::Result<()> {
    let base = Url::parse(&config.crawl.base_url).context("invalid base-url")?;
    let first_page = search_page_url(&base, &config.crawl.sort_order, config.crawl.start_page);

    println!("=== Otomoto Harvester Dry Run ===\n");

    println!("Fetch:");
    println!("  User agent: {}", config.fetch.user_agent);
    println!("  Accept-Language: {}", config.fetch.accept_language);
    println!("  Referer: {}", config.fetch.referer);
    println!(
        "  Delay: {}-{}ms before every request",
        config.fetch.min_delay_ms, config.fetch.max_delay_ms
    );
    println!(
        "  Retries: {} (backoff {}ms, capped at {}ms)",
        config.fetch.max_retries, config.fetch.backoff_base_ms, config.fetch.backoff_max_ms
    );
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Encoding: {}", config.fetch.encoding);

    println!("\nCrawl:");
    println!("  Base URL: {}", config.crawl.base_url);
    println!("  Sort order: {}", config.crawl.sort_order);
    println!("  Listing marker: {}", config.crawl.listing_marker);
    println!("  Start page: {}", config.crawl.start_page);
    match config.crawl.page_limit {
        Some(limit) => println!("  Page limit: {}", limit),
        None => println!("  Page limit: none"),
    }
    println!(
        "  Stop after {} consecutive empty pages",
        config.crawl.empty_page_threshold
    );

    println!("\nOutput:");
    println!("  Batch size: {}", config.output.batch_size);
    println!("  Backup directory: {}", config.output.backup_dir);
    println!(
        "  Blob container: {}",
        if config.output.blob_container_url.is_some() {
            "configured"
        } else {
            "not configured (local backup only)"
        }
    );

    println!("\n✓ Configuration is valid");
    println!("✓ Would start with: {}", first_page);

    Ok(())
}

/// Handles the main harvest operation
async fn handle_harvest(config: Config) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current step and flushing output");
            token.cancel();
        }
    });

    match run_harvest(&config, cancel).await {
        Ok(stats) => {
            tracing::info!("Harvest finished");
            print_statistics(&stats);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Harvest failed: {}", e);
            Err(e).context("harvest failed")
        }
    }
}
