//! ContractFeed CLI — ingestion and store inspection commands.
//!
//! Commands:
//! - `ingest` — fetch one date or a date range and merge into the ledger store
//! - `status` — report ledger files, row counts, date spans, and universe snapshots

use anyhow::{bail, Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use contractfeed_core::config::FeedConfig;
use contractfeed_core::http::HttpFeed;
use contractfeed_core::pipeline::{process_range, StdoutReporter};
use contractfeed_core::rate_limit::RateLimiter;
use contractfeed_core::store::LedgerStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "contractfeed",
    about = "ContractFeed CLI — daily contract-record ingestion"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch one date or a date range and merge into the ledger store.
    Ingest {
        /// Path to the feed TOML config.
        #[arg(long)]
        config: PathBuf,

        /// Single date to ingest (YYYY-MM-DD).
        #[arg(long)]
        date: Option<String>,

        /// Range start (YYYY-MM-DD), inclusive.
        #[arg(long)]
        from: Option<String>,

        /// Range end (YYYY-MM-DD), inclusive.
        #[arg(long)]
        to: Option<String>,

        /// Override the configured API token.
        #[arg(long)]
        token: Option<String>,

        /// Override the configured output root.
        #[arg(long)]
        root: Option<PathBuf>,
    },
    /// Report ledger files, row counts, date spans, and universe snapshots.
    Status {
        /// Path to the feed TOML config.
        #[arg(long)]
        config: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            config,
            date,
            from,
            to,
            token,
            root,
        } => run_ingest(config, date, from, to, token, root),
        Commands::Status { config } => run_status(&config),
    }
}

fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .with_context(|| format!("invalid date '{text}' (expected YYYY-MM-DD)"))
}

fn run_ingest(
    config_path: PathBuf,
    date: Option<String>,
    from: Option<String>,
    to: Option<String>,
    token: Option<String>,
    root: Option<PathBuf>,
) -> Result<()> {
    let (from_date, to_date) = match (date, from, to) {
        (Some(d), None, None) => {
            let d = parse_date(&d)?;
            (d, d)
        }
        (None, Some(f), Some(t)) => {
            let from = parse_date(&f)?;
            let to = parse_date(&t)?;
            if from > to {
                bail!("--from {from} is after --to {to}");
            }
            (from, to)
        }
        (None, None, None) => bail!("one of --date or --from/--to is required"),
        (Some(_), _, _) => bail!("--date and --from/--to are mutually exclusive"),
        _ => bail!("--from and --to must be given together"),
    };

    let mut config = FeedConfig::from_file(&config_path)?;
    if let Some(token) = token {
        config.api.auth_token = token;
    }
    if let Some(root) = root {
        config.output.root = root;
    }

    let limiter = Arc::new(RateLimiter::new(
        config.api.rate_limit_permits,
        Duration::from_secs(config.api.rate_limit_window_secs),
    ));
    let feed = HttpFeed::new(&config.api, limiter)?;
    let store = LedgerStore::new(
        &config.output.root,
        &config.output.vendor,
        &config.output.dataset,
    );

    // Identifier reference data ships separately and is not wired up here;
    // without it, universe output stays off and only ledgers are written.
    println!("Identifier resolution unavailable — universe snapshots disabled for this run.");

    let summary = process_range(&feed, &store, None, &StdoutReporter, from_date, to_date);

    if !summary.clean() {
        for (date, err) in &summary.errors {
            eprintln!("Error for {date}: {err}");
        }
        std::process::exit(1);
    }

    Ok(())
}

fn run_status(config_path: &Path) -> Result<()> {
    let config = FeedConfig::from_file(config_path)?;
    let store = LedgerStore::new(
        &config.output.root,
        &config.output.vendor,
        &config.output.dataset,
    );

    let stats = store.stats()?;

    if stats.ledgers.is_empty() && stats.universe_files == 0 {
        println!("Store is empty: {}", store.dataset_dir().display());
        return Ok(());
    }

    println!("Store: {}", store.dataset_dir().display());
    println!("Ledgers: {}", stats.ledgers.len());
    println!("Universe snapshots: {}", stats.universe_files);
    println!();
    println!("{:<10} {:>8}  {:<12} {:<12}", "Entity", "Rows", "First", "Last");
    println!("{}", "-".repeat(46));
    for ledger in &stats.ledgers {
        println!(
            "{:<10} {:>8}  {:<12} {:<12}",
            ledger.entity,
            ledger.rows,
            fmt_date(ledger.first_date),
            fmt_date(ledger.last_date)
        );
    }

    Ok(())
}

fn fmt_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}
