//! Per-source engagement weighting.

use std::collections::HashMap;
use std::fmt;

use leadscan_core::{metric, Item, Metrics, ScanConfig, Source};

/// Maps an item's metrics to one engagement total.
pub type EngagementFn = Box<dyn Fn(&Metrics) -> i64 + Send + Sync>;

/// Sum of every metric. Used for sources without a registered function.
#[must_use]
pub fn sum_all(metrics: &Metrics) -> i64 {
    metrics.values().fold(0i64, |acc, v| acc.saturating_add(*v))
}

/// Sum of the listed metric keys; absent keys count as zero.
#[must_use]
pub fn sum_keys<S: AsRef<str>>(metrics: &Metrics, keys: &[S]) -> i64 {
    keys.iter()
        .filter_map(|k| metrics.get(k.as_ref()))
        .fold(0i64, |acc, v| acc.saturating_add(*v))
}

/// Engagement functions keyed by source.
///
/// Built-in weighting: Reddit = upvotes + comments, Twitter = likes +
/// retweets + replies. Any other source sums all of its metrics.
pub struct EngagementWeights {
    by_source: HashMap<Source, EngagementFn>,
}

impl EngagementWeights {
    /// No registered functions: every source uses [`sum_all`].
    #[must_use]
    pub fn empty() -> Self {
        Self {
            by_source: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_defaults() -> Self {
        let mut weights = Self::empty();
        weights.register(
            Source::Reddit,
            Box::new(|m: &Metrics| sum_keys(m, &[metric::UPVOTES, metric::COMMENTS])),
        );
        weights.register(
            Source::Twitter,
            Box::new(|m: &Metrics| sum_keys(m, &[metric::LIKES, metric::RETWEETS, metric::REPLIES])),
        );
        weights
    }

    /// Built-in weighting overlaid with the `engagement` section of the scan
    /// configuration.
    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        let mut weights = Self::with_defaults();
        for (source, keys) in &config.engagement {
            let keys = keys.clone();
            weights.register(*source, Box::new(move |m: &Metrics| sum_keys(m, &keys)));
        }
        weights
    }

    /// Replace the function for `source`.
    pub fn register(&mut self, source: Source, weight: EngagementFn) {
        self.by_source.insert(source, weight);
    }

    #[must_use]
    pub fn engagement_for(&self, source: Source, metrics: &Metrics) -> i64 {
        match self.by_source.get(&source) {
            Some(weight) => weight(metrics),
            None => sum_all(metrics),
        }
    }

    #[must_use]
    pub fn engagement(&self, item: &Item) -> i64 {
        self.engagement_for(item.source, &item.metrics)
    }
}

impl Default for EngagementWeights {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl fmt::Debug for EngagementWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut sources: Vec<&Source> = self.by_source.keys().collect();
        sources.sort();
        f.debug_struct("EngagementWeights")
            .field("weighted_sources", &sources)
            .finish()
    }
}
