//! Followings-Archiver main entry point
//!
//! This is the command-line interface for the followed-accounts profile crawler.

use anyhow::Context;
use clap::Parser;
use followings_archiver::config::{load_config_with_hash, Config};
use followings_archiver::crawler::{run_crawl, AccountResult, CrawlReport, RunMode, RunOutcome};
use followings_archiver::images::repair_extensions;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Followings-Archiver: a resumable profile crawler
///
/// Reads the following list from an account archive, fetches every profile
/// through a pool of mirrors, archives avatar and banner images, and exports
/// the results as Cosense pages.
#[derive(Parser, Debug)]
#[command(name = "followings-archiver")]
#[command(version = "1.0.0")]
#[command(about = "A resumable crawler for followed accounts", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Continue an interrupted crawl with the accounts not yet in the ledger
    #[arg(long, conflicts_with_all = ["force", "single", "export_only", "fix_extensions"])]
    resume: bool,

    /// Refetch every account, including those already in the ledger
    #[arg(long, conflicts_with_all = ["resume", "single", "export_only", "fix_extensions"])]
    force: bool,

    /// Fetch only the first pending account and print its record
    #[arg(long, conflicts_with_all = ["resume", "force", "export_only", "fix_extensions"])]
    single: bool,

    /// Regenerate the Cosense export from the ledger without fetching
    #[arg(long, conflicts_with_all = ["resume", "force", "single", "fix_extensions"])]
    export_only: bool,

    /// Add missing `.jpg` extensions to archived images and exit
    #[arg(long, conflicts_with_all = ["resume", "force", "single", "export_only"])]
    fix_extensions: bool,
}

impl Cli {
    fn run_mode(&self) -> RunMode {
        if self.resume {
            RunMode::Resume
        } else if self.force {
            RunMode::Force
        } else if self.single {
            RunMode::Single
        } else if self.export_only {
            RunMode::ExportOnly
        } else {
            RunMode::Normal
        }
    }
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
                .with_context(|| format!("failed to load configuration {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given, using built-in defaults");
            Config::default()
        }
    };

    if cli.fix_extensions {
        return handle_fix_extensions(&config);
    }

    let mode = cli.run_mode();
    tracing::info!(
        "Mode: {:?}, {} mirror(s), ledger {}",
        mode,
        config.mirrors.hosts.len(),
        config.paths.ledger
    );

    match run_crawl(config, mode).await {
        Ok(RunOutcome::Crawled(report)) => print_report(&report),
        Ok(RunOutcome::Single(result)) => print_single(result)?,
        Ok(RunOutcome::Exported(pages)) => println!("✓ Exported {} page(s)", pages),
        Err(e) => {
            tracing::error!("Run failed: {}", e);
            return Err(e.into());
        }
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("followings_archiver=info,warn"),
            1 => EnvFilter::new("followings_archiver=debug,info"),
            2 => EnvFilter::new("followings_archiver=trace,debug"),
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

/// Handles the --fix-extensions mode
fn handle_fix_extensions(config: &Config) -> anyhow::Result<()> {
    let root = Path::new(&config.paths.images);
    let renamed = repair_extensions(root)
        .with_context(|| format!("failed to repair extensions under {}", root.display()))?;
    println!("✓ Renamed {} file(s) under {}", renamed, root.display());
    Ok(())
}

fn print_report(report: &CrawlReport) {
    println!("=== Crawl Summary ===\n");
    println!("  Accounts:        {}", report.total_accounts);
    println!("  Succeeded:       {}", report.succeeded);
    println!("  Skipped:         {}", report.skipped);
    println!("  Fetch failures:  {}", report.fetch_failed);
    println!("  Parse failures:  {}", report.parse_failed);
    println!("  New images:      {}", report.images_stored);
    println!("  Image failures:  {}", report.image_failures);
    if let Some(pages) = report.exported_pages {
        println!("  Exported pages:  {}", pages);
    }
    if report.interrupted {
        println!("\nInterrupted; run again with --resume to continue.");
    }
}

fn print_single(result: Option<AccountResult>) -> anyhow::Result<()> {
    match result {
        None => println!("Nothing to fetch: every account is already in the ledger"),
        Some(AccountResult {
            record: Some(record),
            ..
        }) => println!("{}", serde_json::to_string_pretty(&record)?),
        Some(result) => println!("✘ {} ended in state {}", result.account_id, result.state),
    }
    Ok(())
}
