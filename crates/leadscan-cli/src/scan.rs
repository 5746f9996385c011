//! `leadscan scan`: run the pipeline and render the digest.

use std::path::PathBuf;

use anyhow::Context;
use leadscan_core::{load_scan_config, AppConfig, Source};
use leadscan_digest::{run_scan, JsonFileStore, ScanOptions, ScanOutcome, ScoredItem};
use leadscan_sources::{build_fetchers, disabled_sources};

#[derive(Debug)]
pub(crate) struct ScanArgs {
    pub dry_run: bool,
    pub output: Option<PathBuf>,
    pub json: bool,
    pub sources: Vec<Source>,
}

/// Run one scan with the configured sources.
///
/// # Errors
///
/// Returns an error if the scan configuration cannot be loaded, no keywords
/// are configured, or the output file cannot be written. Source failures and
/// ledger save failures are reported in the summary instead.
pub(crate) async fn run_scan_command(app: &AppConfig, args: &ScanArgs) -> anyhow::Result<()> {
    let scan_config = load_scan_config(&app.scan_config_path).with_context(|| {
        format!(
            "failed to load scan config from {}",
            app.scan_config_path.display()
        )
    })?;

    let mut fetchers =
        build_fetchers(app, &scan_config).context("failed to build source clients")?;
    fetchers.retain(|f| requested(&args.sources, f.source()));
    if fetchers.is_empty() {
        tracing::warn!("no sources enabled; the digest will be empty");
    }

    let store = JsonFileStore::new(&app.ledger_path);
    let options = ScanOptions {
        dry_run: args.dry_run,
        disabled: disabled_sources(app, &scan_config)
            .into_iter()
            .filter(|source| requested(&args.sources, *source))
            .collect(),
        ..ScanOptions::from_app_config(app)
    };

    let outcome = run_scan(fetchers, &scan_config, &store, &options)
        .await
        .context("scan failed")?;

    if let Some(path) = &args.output {
        let body = serde_json::to_string_pretty(&outcome)?;
        std::fs::write(path, body)
            .with_context(|| format!("failed to write digest to {}", path.display()))?;
        tracing::info!(path = %path.display(), "digest written");
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print_summary(&outcome);
    }
    Ok(())
}

/// Whether `source` is part of this scan; an empty `--source` list means all.
fn requested(only: &[Source], source: Source) -> bool {
    only.is_empty() || only.contains(&source)
}

fn markers(item: &ScoredItem) -> String {
    let mut tags = Vec::new();
    if item.hot.is_some() {
        tags.push("HOT");
    }
    if item.is_new {
        tags.push("NEW");
    }
    if tags.is_empty() {
        String::new()
    } else {
        format!("[{}] ", tags.join(","))
    }
}

fn print_item(item: &ScoredItem) {
    println!(
        "  - {}{} ({}, score {}, engagement {})",
        markers(item),
        item.item.title,
        item.item.source_name,
        item.source_score,
        item.engagement
    );
    println!("    {}", item.url());
    if !item.matched_keywords.is_empty() {
        println!("    keywords: {}", item.matched_keywords.join(", "));
    }
}

fn print_summary(outcome: &ScanOutcome) {
    let report = &outcome.report;
    let digest = &outcome.digest;
    let counts = &report.counts;

    println!(
        "scan finished {}",
        report.finished_at.format("%Y-%m-%d %H:%M UTC")
    );
    println!("{:<12}{:<24}STATUS", "SOURCE", "LABEL");
    for source in &report.sources {
        println!(
            "{:<12}{:<24}{}",
            source.source.as_str(),
            source.label,
            source.status
        );
    }
    println!(
        "{} normalized, {} dropped, {} filtered, {} new, {} hot, {} pruned",
        counts.normalized,
        counts.dropped,
        counts.service_offers + counts.below_floor,
        counts.new_items,
        counts.hot_items,
        counts.pruned
    );

    if !digest.hot.is_empty() {
        println!("\nHOT");
        for item in digest.hot_items() {
            print_item(item);
        }
    }

    for group in &digest.groups {
        println!(
            "\n{} ({} of {})",
            group.source.as_str().to_uppercase(),
            group.items.len(),
            group.total
        );
        for item in digest.group_items(group.source) {
            print_item(item);
        }
    }

    if !digest.discoveries.is_empty() {
        println!("\nDISCOVERIES");
        for item in digest.discovery_items() {
            print_item(item);
        }
    }

    if digest.is_empty() {
        println!("\nno leads this scan");
    }
    if !report.persisted {
        println!(
            "\nledger not saved ({}); these items will be reported as new next scan",
            report.ledger_location
        );
    }
}
