//! Tradeline main entry point
//!
//! This is the command-line interface for the Tradeline directory harvester.

use anyhow::{Context, Result};
use clap::Parser;
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tradeline::config::{load_config_with_hash, validate, Config, ListingMode};
use tradeline::crawler::{CrawlOutcome, Harvester};
use tradeline::output::{print_statistics, write_table};
use tradeline::url::{listing_url, normalize_state_code};

/// Tradeline: a business directory harvester
///
/// Walks the directory listings of one state page by page, visits every
/// business's detail page and prints the collected contact rows as a
/// tab-separated table.
#[derive(Parser, Debug)]
#[command(name = "tradeline")]
#[command(version)]
#[command(about = "A business directory harvester", long_about = None)]
struct Cli {
    /// Two-letter state code to harvest (e.g. ca)
    #[arg(value_name = "STATE")]
    state: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Listing mode (structured or resilient), overrides the config file
    #[arg(long)]
    mode: Option<ListingMode>,

    /// Stop after this many listing pages
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Maximum number of detail fetches in flight
    #[arg(long, value_name = "N")]
    concurrency: Option<u32>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = resolve_config(&cli)?;
    let state_code = normalize_state_code(&cli.state).context("Invalid state argument")?;

    if cli.dry_run {
        handle_dry_run(&config, &state_code)
    } else {
        handle_crawl(config, &state_code).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("tradeline=info,warn"),
            1 => EnvFilter::new("tradeline=debug,info"),
            2 => EnvFilter::new("tradeline=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
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

    if let Some(mode) = cli.mode {
        config.directory.mode = mode;
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = Some(max_pages);
    }
    if let Some(concurrency) = cli.concurrency {
        config.crawler.concurrency = concurrency;
    }

    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, state_code: &str) -> Result<()> {
    let base = url::Url::parse(&config.directory.base_url)?;
    let first_page = listing_url(&base, state_code, 1)?;

    println!("=== Tradeline Dry Run ===\n");

    println!("Directory:");
    println!("  Base URL: {}", config.directory.base_url);
    println!("  Mode: {}", config.directory.mode);
    println!("  Detail path prefix: {}", config.directory.detail_path_prefix);

    println!("\nCrawler:");
    println!("  Concurrency: {}", config.crawler.concurrency);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Download delay: {}ms", config.crawler.download_delay_ms);
    println!("  Empty row threshold: {}", config.crawler.empty_row_threshold);
    match config.crawler.max_pages {
        Some(max) => println!("  Max pages: {}", max),
        None => println!("  Max pages: unbounded"),
    }

    println!("\nHeaders:");
    println!("  User-Agent: {}", config.headers.user_agent);
    println!("  Accept-Language: {}", config.headers.accept_language);

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling at {}", first_page);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, state_code: &str) -> Result<()> {
    let poll_interval = Duration::from_millis(config.output.poll_interval_ms);

    let mut harvester = Harvester::new(config);
    harvester
        .start(state_code)
        .context("Failed to start crawl")?;

    let mut ticker = tokio::time::interval(poll_interval);
    let mut last_count = 0;
    let mut interrupts = 0;
    let mut listening = true;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let count = harvester.snapshot().len();
                if count != last_count {
                    tracing::info!("{} rows collected", count);
                    last_count = count;
                }
                if !harvester.is_running() {
                    break;
                }
            }
            result = tokio::signal::ctrl_c(), if listening => {
                if let Err(e) = result {
                    tracing::warn!("Failed to listen for Ctrl-C: {}", e);
                    listening = false;
                    continue;
                }
                interrupts += 1;
                match interrupt_action(interrupts) {
                    Interrupt::Stop => {
                        tracing::info!(
                            "Interrupt received, finishing in-flight requests (Ctrl-C again to quit)"
                        );
                        harvester.request_stop();
                    }
                    Interrupt::Exit => {
                        tracing::warn!("Second interrupt received, exiting without waiting");
                        std::process::exit(130);
                    }
                }
            }
        }
    }

    let outcome = harvester.wait().await.context("Crawl failed")?;
    print_outcome(&outcome)?;

    Ok(())
}

/// What a Ctrl-C press does
#[derive(Debug, PartialEq, Eq)]
enum Interrupt {
    /// Ask the crawl to stop after in-flight requests
    Stop,
    /// Leave immediately
    Exit,
}

fn interrupt_action(presses: u32) -> Interrupt {
    if presses <= 1 {
        Interrupt::Stop
    } else {
        Interrupt::Exit
    }
}

/// Prints the collected rows and the end-of-run summary
fn print_outcome(outcome: &CrawlOutcome) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_table(&mut out, &outcome.records).context("Failed to write results")?;
    out.flush()?;
    drop(out);

    println!();
    println!("{}", outcome.reason);
    println!(
        "Started {} and ran for {}s",
        outcome.started_at.format("%Y-%m-%d %H:%M:%S UTC"),
        outcome.elapsed().num_seconds()
    );
    println!();
    print_statistics(&outcome.stats);

    Ok(())
}
