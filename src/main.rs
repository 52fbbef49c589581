//! Review-Harvest main entry point
//!
//! Command-line interface for the review scraping pipeline.

use anyhow::Context;
use clap::Parser;
use review_harvest::config::Config;
use review_harvest::records::ScrapeOutcome;
use review_harvest::scraper::{is_bot_detection, scrape};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Review-Harvest: review extraction from paginated listings
///
/// Walks a paginated review listing, extracts and normalizes every review
/// it can locate, deduplicates across pages, and writes the result as CSV.
#[derive(Parser, Debug)]
#[command(name = "review-harvest")]
#[command(version)]
#[command(about = "Scrape reviews from a paginated listing into CSV", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be scraped without scraping
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) =
        review_harvest::config::load_config_with_hash(&cli.config).with_context(|| {
            format!("failed to load configuration from {}", cli.config.display())
        })?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    handle_scrape(config).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("review_harvest=info,warn"),
            1 => EnvFilter::new("review_harvest=debug,info"),
            2 => EnvFilter::new("review_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows the plan
fn handle_dry_run(config: &Config) {
    println!("=== Review-Harvest Dry Run ===\n");

    println!("Target:");
    println!("  URL: {}", config.target.url);
    println!("  Max pages: {}", config.target.max_pages);

    println!("\nPacing:");
    println!(
        "  Min request interval: {}ms",
        config.scraper.min_request_interval
    );
    println!(
        "  Retries: {} (backoff {}ms..{}ms)",
        config.scraper.max_retries,
        config.scraper.base_retry_delay,
        config.scraper.max_retry_delay
    );
    println!("  Page timeout: {}ms", config.scraper.page_timeout);

    println!("\nOutput:");
    println!("  CSV: {}", config.output.path);
    println!(
        "  Checkpoint every {} pages",
        config.output.checkpoint_interval
    );

    if config.selectors.containers.is_empty() {
        println!("\nSelectors: built-in candidate lists");
    } else {
        println!(
            "\nSelectors: {} container override(s):",
            config.selectors.containers.len()
        );
        for selector in &config.selectors.containers {
            println!("  - {}", selector);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Runs the scrape, racing it against interrupt signals
///
/// Exit codes: 0 on success (including success with non-fatal errors),
/// 1 on fatal error, 130 on SIGINT, 143 on SIGTERM.
async fn handle_scrape(config: Config) -> anyhow::Result<()> {
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        .context("failed to install SIGTERM handler")?;

    tokio::select! {
        result = scrape(config) => match result {
            Ok(outcome) => {
                print_summary(&outcome);
                Ok(())
            }
            Err(e) => {
                if is_bot_detection(&e.to_string()) {
                    eprintln!("✗ The target site is serving an anti-bot challenge.");
                    eprintln!("  Scraping cannot continue; any records collected were exported.");
                } else {
                    eprintln!("✗ Scrape failed: {}", e);
                    eprintln!("  Any records collected were exported.");
                }
                std::process::exit(1);
            }
        },
        _ = tokio::signal::ctrl_c() => {
            eprintln!("Interrupted");
            std::process::exit(130);
        }
        _ = sigterm.recv() => {
            eprintln!("Terminated");
            std::process::exit(143);
        }
    }
}

/// Prints the end-of-run summary
fn print_summary(outcome: &ScrapeOutcome) {
    println!(
        "✓ Scraped {} reviews from {} pages in {}s",
        outcome.records.len(),
        outcome.pages_processed,
        outcome.duration_seconds()
    );

    if outcome.has_errors() {
        println!(
            "  {} non-fatal issue(s) were logged during the run:",
            outcome.errors.len()
        );
        for error in &outcome.errors {
            println!("  - {}", error);
        }
    }
}
