//! DocHarvest main entry point
//!
//! This is the command-line interface for the DocHarvest document crawler.

use clap::Parser;
use dialoguer::{theme::ColorfulTheme, Input};
use docharvest::config::{load_config_with_hash, Config};
use docharvest::crawler::Coordinator;
use docharvest::output::{
    load_statistics, print_crawl_summary, print_statistics, print_verify_summary,
    CheckpointStatistics,
};
use docharvest::state::CheckpointStore;
use docharvest::storage::open_storage;
use docharvest::url::{normalize_url, CrawlRules};
use docharvest::verify::Verifier;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// DocHarvest: A polite, resumable document crawler
///
/// DocHarvest walks web pages outward from a seed URL, records links to
/// downloadable documents, and checkpoints its progress so an interrupted
/// crawl resumes where it stopped. `--verify` revisits the recorded links
/// and stores their HTTP metadata.
#[derive(Parser, Debug)]
#[command(name = "docharvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite, resumable document crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed URL to start from (prompted for when nothing is queued)
    #[arg(long, value_name = "URL", conflicts_with_all = ["verify", "stats", "dry_run"])]
    seed: Option<String>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Verify recorded document links instead of crawling
    #[arg(long, conflicts_with_all = ["stats", "dry_run"])]
    verify: bool,

    /// Show statistics from the database and checkpoints and exit
    #[arg(long, conflicts_with_all = ["verify", "dry_run"])]
    stats: bool,

    /// Validate config and rules and show what would be used without crawling
    #[arg(long, conflicts_with_all = ["verify", "stats"])]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let config = match load_config_with_hash(&cli.config) {
        Ok((cfg, hash)) => {
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            cfg
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config)?;
    } else if cli.stats {
        handle_stats(&config)?;
    } else if cli.verify {
        handle_verify(&config).await?;
    } else {
        handle_crawl(&config, cli.seed.as_deref()).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("docharvest=info,warn"),
            1 => EnvFilter::new("docharvest=debug,info"),
            2 => EnvFilter::new("docharvest=trace,debug"),
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

/// Resolves when the operator presses Ctrl-C
async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Could not listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Asks the operator for a seed URL until an http(s) URL is entered
fn prompt_for_seed() -> Result<String, dialoguer::Error> {
    Input::with_theme(&ColorfulTheme::default())
        .with_prompt("Nothing is queued. Seed URL to start from")
        .validate_with(|input: &String| -> Result<(), String> {
            normalize_url(input)
                .map(|_| ())
                .map_err(|e| e.to_string())
        })
        .interact_text()
}

/// Handles the --dry-run mode: validates config and rules and shows them
fn handle_dry_run(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== DocHarvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Request delay: {}ms", config.crawler.request_delay_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!("  Document batch size: {}", config.crawler.pdf_batch_size);
    println!("  Failure budget: {}", config.crawler.failure_budget);

    println!("\nVerifier Configuration:");
    println!("  Request delay: {}ms", config.verifier.request_delay_ms);
    println!("  Prefix bytes: {}", config.verifier.prefix_bytes);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nState:");
    println!("  Checkpoints: {}", config.state.directory.display());
    println!("  Database: {}", config.state.database_path.display());

    let rules = CrawlRules::from_config(&config.rules)?;
    println!("\nRules (match mode: {}):", rules.mode());
    if rules.allow_patterns().is_empty() {
        println!("  Allow: everything");
    } else {
        println!("  Allow ({}):", rules.allow_patterns().len());
        for pattern in rules.allow_patterns() {
            println!("    - {}", pattern);
        }
    }
    println!("  Block ({}):", rules.block_patterns().len());
    for pattern in rules.block_patterns() {
        println!("    - {}", pattern);
    }

    println!("\n✓ Configuration is valid");

    Ok(())
}

/// Handles the --stats mode: shows statistics from the database and checkpoints
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    println!("Database: {}", config.state.database_path.display());
    println!("Checkpoints: {}\n", config.state.directory.display());

    let storage = open_storage(&config.state.database_path)?;
    let docs = load_statistics(&storage)?;

    let checkpoints = CheckpointStore::open(&config.state.directory)?;
    let loaded = checkpoints.load(config.crawler.max_depth)?;

    print_statistics(&docs, &CheckpointStatistics::from(&loaded));

    Ok(())
}

/// Handles the --verify mode: probes every unverified document link
async fn handle_verify(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut verifier = Verifier::new(config)?;
    if verifier.load_pending()? == 0 {
        println!("Nothing to verify.");
        return Ok(());
    }

    match verifier.run_until(interrupted()).await {
        Ok(summary) => {
            print_verify_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Verification failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, seed: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let mut coordinator = Coordinator::new(config)?;

    if let Some(seed) = seed {
        coordinator.add_seed(seed)?;
    }

    if coordinator.needs_seed() {
        let seed = prompt_for_seed()?;
        coordinator.add_seed(&seed)?;
    }

    if coordinator.needs_seed() {
        println!("Nothing eligible to crawl.");
        return Ok(());
    }

    // Run the crawler
    match coordinator.run_until(interrupted()).await {
        Ok(summary) => {
            print_crawl_summary(&summary);
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
