mod ledger;
mod rank;
mod scan;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use leadscan_core::Source;
use tracing_subscriber::EnvFilter;

use crate::ledger::LedgerCommands;

#[derive(Debug, Parser)]
#[command(name = "leadscan")]
#[command(about = "Scan communities for automation leads and build a digest")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Fetch every configured source and print the digest
    Scan {
        /// Build the digest without saving the ledger
        #[arg(long)]
        dry_run: bool,

        /// Write the digest and scan report as JSON to this file
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Print the JSON document to stdout instead of the summary
        #[arg(long)]
        json: bool,

        /// Restrict the scan to these sources (repeatable)
        #[arg(long = "source", value_name = "SOURCE")]
        sources: Vec<Source>,
    },
    /// Score sub-source names (subreddits, channels, accounts) by relevance
    Rank {
        /// Names to rank
        names: Vec<String>,

        /// Read names from a file: one per line, or CSV with a `Subreddit` column
        #[arg(long)]
        file: Option<PathBuf>,

        /// Drop names scoring below this value
        #[arg(long, default_value_t = 0)]
        min_score: u8,

        /// Show at most this many names
        #[arg(long)]
        top: Option<usize>,
    },
    /// Inspect or maintain the seen-item ledger
    Ledger {
        #[command(subcommand)]
        command: LedgerCommands,
    },
}

fn init_tracing(log_level: &str) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .context("invalid log filter")?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let app = leadscan_core::load_app_config().context("failed to load environment config")?;
    init_tracing(&app.log_level)?;
    tracing::debug!(env = %app.env, scan_config = %app.scan_config_path.display(), "configuration loaded");

    match cli.command {
        Commands::Scan {
            dry_run,
            output,
            json,
            sources,
        } => {
            scan::run_scan_command(
                &app,
                &scan::ScanArgs {
                    dry_run,
                    output,
                    json,
                    sources,
                },
            )
            .await
        }
        Commands::Rank {
            names,
            file,
            min_score,
            top,
        } => rank::run_rank(&app, names, file.as_deref(), min_score, top),
        Commands::Ledger { command } => ledger::run_ledger(&app, command),
    }
}
