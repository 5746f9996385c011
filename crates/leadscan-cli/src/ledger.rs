//! `leadscan ledger`: inspect and prune the seen-item history.

use anyhow::Context;
use chrono::Utc;
use clap::Subcommand;
use leadscan_core::{load_scan_config, AppConfig, MAX_RETENTION_DAYS};
use leadscan_digest::{JsonFileStore, LedgerStore};

#[derive(Debug, Subcommand)]
pub enum LedgerCommands {
    /// Show entry count and the first-seen range
    Stats,
    /// Drop entries first seen before the retention window and save
    Prune {
        /// Retention in days; defaults to `retention_days` from the scan config
        #[arg(long, value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_RETENTION_DAYS)))]
        days: Option<u32>,
    },
}

fn retention_days(app: &AppConfig, days: Option<u32>) -> anyhow::Result<u32> {
    if let Some(days) = days {
        return Ok(days);
    }
    let config = load_scan_config(&app.scan_config_path).with_context(|| {
        format!(
            "failed to load scan config from {}",
            app.scan_config_path.display()
        )
    })?;
    Ok(config.retention_days)
}

/// # Errors
///
/// Returns an error if the ledger cannot be read or written.
pub(crate) fn run_ledger(app: &AppConfig, command: LedgerCommands) -> anyhow::Result<()> {
    let store = JsonFileStore::new(&app.ledger_path);
    let mut ledger = store
        .load()
        .with_context(|| format!("failed to load ledger from {}", store.location()))?;

    match command {
        LedgerCommands::Stats => {
            let stats = ledger.stats();
            println!("ledger: {}", store.location());
            println!("entries: {}", stats.entries);
            if let (Some(oldest), Some(newest)) = (stats.oldest_first_seen, stats.newest_first_seen)
            {
                println!("oldest first seen: {}", oldest.to_rfc3339());
                println!("newest first seen: {}", newest.to_rfc3339());
            }
        }
        LedgerCommands::Prune { days } => {
            let days = retention_days(app, days)?;
            let removed = ledger.prune(Utc::now(), chrono::Duration::days(i64::from(days)));
            store
                .save(&ledger)
                .with_context(|| format!("failed to save ledger to {}", store.location()))?;
            tracing::info!(removed, remaining = ledger.len(), days, "ledger pruned");
            println!("removed {removed} entries, {} remaining", ledger.len());
        }
    }
    Ok(())
}
