//! `leadscan rank`: score arbitrary sub-source names against the tiers.

use std::path::Path;

use anyhow::Context;
use leadscan_core::{load_scan_config, AppConfig};
use leadscan_digest::SourceRanker;

/// Extract names from a list file.
///
/// Blank lines and `#` comments are skipped. When the first line is a CSV
/// header containing a `Subreddit` column, that column is read from every
/// following row.
pub(crate) fn parse_name_list(content: &str) -> Vec<String> {
    let mut lines = content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .peekable();

    let column = lines.peek().and_then(|header| {
        header
            .split(',')
            .position(|col| col.trim().trim_matches('"').eq_ignore_ascii_case("subreddit"))
    });
    if column.is_some() {
        lines.next();
    }

    lines
        .filter_map(|line| match column {
            Some(i) => line.split(',').nth(i).map(|c| c.trim().trim_matches('"')),
            None => Some(line),
        })
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn load_ranker(app: &AppConfig) -> anyhow::Result<SourceRanker> {
    if !app.scan_config_path.exists() {
        tracing::debug!(
            path = %app.scan_config_path.display(),
            "scan config not found; using default tiers"
        );
        return Ok(SourceRanker::default());
    }
    let config = load_scan_config(&app.scan_config_path).with_context(|| {
        format!(
            "failed to load scan config from {}",
            app.scan_config_path.display()
        )
    })?;
    Ok(SourceRanker::from_config(&config))
}

/// Print names ranked by tier score, best first.
///
/// # Errors
///
/// Returns an error if no names were given, the name file cannot be read, or
/// an existing scan config is invalid.
pub(crate) fn run_rank(
    app: &AppConfig,
    mut names: Vec<String>,
    file: Option<&Path>,
    min_score: u8,
    top: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(path) = file {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read names from {}", path.display()))?;
        names.extend(parse_name_list(&content));
    }
    if names.is_empty() {
        anyhow::bail!("no names to rank; pass names as arguments or use --file");
    }

    let ranker = load_ranker(app)?;
    let ranked = ranker.rank_all(&names, min_score, top);
    if ranked.is_empty() {
        println!("no names scored {min_score} or above");
        return Ok(());
    }

    println!("{:<32}{:<8}TIER", "NAME", "SCORE");
    for entry in &ranked {
        println!(
            "{:<32}{:<8}{}",
            entry.source_name,
            entry.score,
            entry.tier.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
