//! Static relevance of a sub-source name (subreddit, channel, account).
//!
//! Tiers are evaluated top-down and the first matching tier wins. Names and
//! keywords are compared in a folded form: lowercased, a leading `r/` or `@`
//! removed, and everything except letters and digits dropped, so
//! `r/Small_Business` and `smallbusiness` are the same name.

use leadscan_core::{MatchMode, ScanConfig, TierRule};
use serde::Serialize;

/// A ranked source name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceScore {
    pub source_name: String,
    pub score: u8,
    /// Name of the tier that matched, `None` for the default score of 0.
    pub tier: Option<String>,
}

#[derive(Debug, Clone)]
struct Tier {
    name: String,
    score: u8,
    mode: MatchMode,
    keywords: Vec<String>,
}

impl Tier {
    fn matches(&self, folded: &str) -> bool {
        self.keywords.iter().any(|keyword| match self.mode {
            MatchMode::Exact => folded == keyword,
            MatchMode::Substring => folded.contains(keyword.as_str()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct SourceRanker {
    tiers: Vec<Tier>,
}

impl SourceRanker {
    #[must_use]
    pub fn new(rules: &[TierRule]) -> Self {
        let tiers = rules
            .iter()
            .map(|rule| Tier {
                name: rule.name.clone(),
                score: rule.score.min(100),
                mode: rule.match_mode,
                keywords: rule
                    .keywords
                    .iter()
                    .map(|k| fold_name(k))
                    .filter(|k| !k.is_empty())
                    .collect(),
            })
            .collect();
        Self { tiers }
    }

    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(&config.tiers)
    }

    fn matching_tier(&self, source_name: &str) -> Option<&Tier> {
        let folded = fold_name(source_name);
        if folded.is_empty() {
            return None;
        }
        self.tiers.iter().find(|tier| tier.matches(&folded))
    }

    /// Score 0-100 for `source_name`; 0 when no tier matches.
    #[must_use]
    pub fn rank(&self, source_name: &str) -> u8 {
        self.matching_tier(source_name).map_or(0, |tier| tier.score)
    }

    #[must_use]
    pub fn score(&self, source_name: &str) -> SourceScore {
        let tier = self.matching_tier(source_name);
        SourceScore {
            source_name: source_name.to_string(),
            score: tier.map_or(0, |t| t.score),
            tier: tier.map(|t| t.name.clone()),
        }
    }

    /// Rank a list of names, keep those scoring at least `min_score`, and sort
    /// by score descending then name. Duplicate names (after folding) are
    /// ranked once. `top` truncates the result.
    #[must_use]
    pub fn rank_all<I, S>(&self, names: I, min_score: u8, top: Option<usize>) -> Vec<SourceScore>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = std::collections::HashSet::new();
        let mut scores: Vec<SourceScore> = names
            .into_iter()
            .filter_map(|name| {
                let name = name.as_ref().trim();
                let folded = fold_name(name);
                if folded.is_empty() || !seen.insert(folded) {
                    return None;
                }
                Some(self.score(name))
            })
            .filter(|s| s.score >= min_score)
            .collect();
        scores.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| a.source_name.to_lowercase().cmp(&b.source_name.to_lowercase()))
        });
        if let Some(top) = top {
            scores.truncate(top);
        }
        scores
    }
}

impl Default for SourceRanker {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

fn fold_name(name: &str) -> String {
    let trimmed = name.trim();
    let lowered = trimmed.to_lowercase();
    let stripped = lowered
        .strip_prefix("/r/")
        .or_else(|| lowered.strip_prefix("r/"))
        .or_else(|| lowered.strip_prefix('@'))
        .unwrap_or(&lowered);
    stripped.chars().filter(|c| c.is_alphanumeric()).collect()
}
