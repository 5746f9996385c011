//! YAML scan configuration: keywords, source tiers, thresholds and fetch settings.
//!
//! Everything in here is expected to change between runs, so it lives in a
//! file rather than in code. Defaults reproduce the constants the digest has
//! always used (tiers 100/90/70/60/50, hot at 1.5x, 7-day retention, 20 items
//! per source).

use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::item::Source;
use crate::ConfigError;

/// Upper bound for `retention_days` (about a century).
pub const MAX_RETENTION_DAYS: u32 = 36_500;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// Name equals a keyword once case and punctuation are ignored.
    Exact,
    #[default]
    Substring,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRule {
    pub name: String,
    pub score: u8,
    #[serde(rename = "match", default)]
    pub match_mode: MatchMode,
    pub keywords: Vec<String>,
}

impl TierRule {
    fn new(name: &str, score: u8, match_mode: MatchMode, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            score,
            match_mode,
            keywords: keywords.iter().map(|k| (*k).to_string()).collect(),
        }
    }
}

/// An allow-list entry. Without a `name` the whole platform counts as monitored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonitoredSource {
    pub source: Source,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    #[serde(default = "default_delay_ms")]
    pub default_delay_ms: u64,
    #[serde(default)]
    pub per_source: BTreeMap<Source, u64>,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            default_delay_ms: default_delay_ms(),
            per_source: BTreeMap::new(),
        }
    }
}

impl RateLimitConfig {
    /// Minimum delay between two requests to the same source.
    #[must_use]
    pub fn delay_for(&self, source: Source) -> Duration {
        let ms = self
            .per_source
            .get(&source)
            .copied()
            .unwrap_or(self.default_delay_ms);
        Duration::from_millis(ms)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default = "default_true")]
    pub exclude_service_offers: bool,
    #[serde(default)]
    pub min_keyword_matches: usize,
    #[serde(default)]
    pub min_engagement: BTreeMap<Source, i64>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            exclude_service_offers: true,
            min_keyword_matches: 0,
            min_engagement: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedditSourceConfig {
    pub subreddits: Vec<String>,
    #[serde(default = "default_reddit_sort")]
    pub sort: String,
    #[serde(default = "default_reddit_limit")]
    pub limit: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedConfig {
    pub name: String,
    pub url: String,
    /// Re-tag entries from this feed; only `rss` and `health` are allowed.
    #[serde(default)]
    pub source: Option<Source>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YoutubeChannelConfig {
    pub name: String,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubSourceConfig {
    pub queries: Vec<String>,
    #[serde(default = "default_github_per_page")]
    pub per_page: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TwitterSourceConfig {
    pub accounts: Vec<String>,
    #[serde(default = "default_twitter_max_results")]
    pub max_results: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoltbookSourceConfig {
    #[serde(default = "default_moltbook_limit")]
    pub limit: u32,
}

impl Default for RedditSourceConfig {
    fn default() -> Self {
        Self {
            subreddits: Vec::new(),
            sort: default_reddit_sort(),
            limit: default_reddit_limit(),
        }
    }
}

impl Default for GithubSourceConfig {
    fn default() -> Self {
        Self {
            queries: Vec::new(),
            per_page: default_github_per_page(),
        }
    }
}

impl Default for TwitterSourceConfig {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            max_results: default_twitter_max_results(),
        }
    }
}

impl Default for MoltbookSourceConfig {
    fn default() -> Self {
        Self {
            limit: default_moltbook_limit(),
        }
    }
}

/// Per-platform fetch settings. An absent section disables that fetcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourcesConfig {
    #[serde(default)]
    pub reddit: Option<RedditSourceConfig>,
    #[serde(default)]
    pub rss: Vec<FeedConfig>,
    #[serde(default)]
    pub youtube: Vec<YoutubeChannelConfig>,
    #[serde(default)]
    pub github: Option<GithubSourceConfig>,
    #[serde(default)]
    pub twitter: Option<TwitterSourceConfig>,
    #[serde(default)]
    pub moltbook: Option<MoltbookSourceConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default = "default_tiers")]
    pub tiers: Vec<TierRule>,
    #[serde(default = "default_hot_threshold")]
    pub hot_threshold: f64,
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    #[serde(default = "default_per_source_limit")]
    pub per_source_limit: usize,
    #[serde(default)]
    pub monitored: Vec<MonitoredSource>,
    /// Metric keys summed into engagement, overriding the built-in weighting.
    #[serde(default)]
    pub engagement: BTreeMap<Source, Vec<String>>,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            tiers: default_tiers(),
            hot_threshold: default_hot_threshold(),
            retention_days: default_retention_days(),
            per_source_limit: default_per_source_limit(),
            monitored: Vec::new(),
            engagement: BTreeMap::new(),
            rate_limit: RateLimitConfig::default(),
            filters: FilterConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Retention window for the seen-item ledger.
    #[must_use]
    pub fn retention(&self) -> chrono::Duration {
        chrono::Duration::days(i64::from(self.retention_days))
    }

    /// Whether `(source, source_name)` is on the monitored allow-list.
    ///
    /// Names compare case-insensitively and ignore a leading `r/` or `@`.
    #[must_use]
    pub fn is_monitored(&self, source: Source, source_name: &str) -> bool {
        let wanted = normalize_source_name(source_name);
        self.monitored.iter().any(|m| {
            m.source == source
                && m
                    .name
                    .as_deref()
                    .is_none_or(|name| normalize_source_name(name) == wanted)
        })
    }
}

fn normalize_source_name(name: &str) -> String {
    let trimmed = name.trim();
    let stripped = trimmed
        .strip_prefix("r/")
        .or_else(|| trimmed.strip_prefix('@'))
        .unwrap_or(trimmed);
    stripped.to_lowercase()
}

/// Load and validate the scan configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_scan_config(path: &Path) -> Result<ScanConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ScanFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let config: ScanConfig = serde_yaml::from_str(&content)?;
    validate_scan_config(&config)?;
    Ok(config)
}

fn validate_scan_config(config: &ScanConfig) -> Result<(), ConfigError> {
    if config.keywords.iter().all(|k| k.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "at least one keyword must be configured".to_string(),
        ));
    }

    let mut seen_tiers = HashSet::new();
    for tier in &config.tiers {
        if tier.score > 100 {
            return Err(ConfigError::Validation(format!(
                "tier '{}' has score {}; must be between 0 and 100",
                tier.name, tier.score
            )));
        }
        if !seen_tiers.insert(tier.name.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "duplicate tier name: '{}'",
                tier.name
            )));
        }
    }

    if !config.hot_threshold.is_finite() || config.hot_threshold <= 1.0 {
        return Err(ConfigError::Validation(format!(
            "hot_threshold must be greater than 1.0, got {}",
            config.hot_threshold
        )));
    }

    if !(1..=MAX_RETENTION_DAYS).contains(&config.retention_days) {
        return Err(ConfigError::Validation(format!(
            "retention_days must be between 1 and {MAX_RETENTION_DAYS}, got {}",
            config.retention_days
        )));
    }

    if config.per_source_limit == 0 {
        return Err(ConfigError::Validation(
            "per_source_limit must be at least 1".to_string(),
        ));
    }

    for feed in &config.sources.rss {
        if let Some(source) = feed.source {
            if !matches!(source, Source::Rss | Source::Health) {
                return Err(ConfigError::Validation(format!(
                    "feed '{}' cannot be tagged as {source}; use rss or health",
                    feed.name
                )));
            }
        }
    }

    Ok(())
}

fn default_tiers() -> Vec<TierRule> {
    vec![
        TierRule::new(
            "perfect",
            100,
            MatchMode::Exact,
            &["entrepreneur", "smallbusiness", "startups", "saas"],
        ),
        TierRule::new(
            "high_value",
            90,
            MatchMode::Substring,
            &[
                "entrepreneur",
                "business",
                "startup",
                "saas",
                "marketing",
                "sidehustle",
                "ecommerce",
                "freelance",
                "consulting",
                "agency",
                "automation",
            ],
        ),
        TierRule::new(
            "medium",
            70,
            MatchMode::Substring,
            &[
                "workflow",
                "productivity",
                "efficiency",
                "tools",
                "software",
                "nocode",
                "lowcode",
                "integration",
            ],
        ),
        TierRule::new(
            "industry",
            60,
            MatchMode::Substring,
            &[
                "realestate",
                "finance",
                "accounting",
                "legal",
                "medical",
                "fitness",
                "education",
                "sales",
                "crm",
            ],
        ),
        TierRule::new(
            "help",
            50,
            MatchMode::Substring,
            &["help", "tips", "advice", "howto", "ask", "question"],
        ),
    ]
}

fn default_hot_threshold() -> f64 {
    1.5
}

fn default_retention_days() -> u32 {
    7
}

fn default_per_source_limit() -> usize {
    20
}

fn default_delay_ms() -> u64 {
    2_000
}

fn default_true() -> bool {
    true
}

fn default_reddit_sort() -> String {
    "new".to_string()
}

fn default_reddit_limit() -> u32 {
    25
}

fn default_github_per_page() -> u32 {
    20
}

fn default_twitter_max_results() -> u32 {
    10
}

fn default_moltbook_limit() -> u32 {
    50
}

#[cfg(test)]
#[path = "scan_config_test.rs"]
mod tests;
