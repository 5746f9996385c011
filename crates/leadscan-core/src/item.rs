//! The uniform record every platform adapter produces.

use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Named numeric signals reported by a platform. The key set varies by source.
pub type Metrics = BTreeMap<String, i64>;

/// Well-known metric keys written by the normalizers.
pub mod metric {
    pub const UPVOTES: &str = "upvotes";
    pub const COMMENTS: &str = "comments";
    pub const LIKES: &str = "likes";
    pub const RETWEETS: &str = "retweets";
    pub const REPLIES: &str = "replies";
    pub const STARS: &str = "stars";
    pub const FORKS: &str = "forks";
    pub const VIEWS: &str = "views";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Reddit,
    Twitter,
    Youtube,
    Moltbook,
    Rss,
    Github,
    Health,
}

impl Source {
    pub const ALL: [Source; 7] = [
        Source::Reddit,
        Source::Twitter,
        Source::Youtube,
        Source::Moltbook,
        Source::Rss,
        Source::Github,
        Source::Health,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Source::Reddit => "reddit",
            Source::Twitter => "twitter",
            Source::Youtube => "youtube",
            Source::Moltbook => "moltbook",
            Source::Rss => "rss",
            Source::Github => "github",
            Source::Health => "health",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("unknown source '{0}'")]
pub struct ParseSourceError(pub String);

impl FromStr for Source {
    type Err = ParseSourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Source::ALL
            .into_iter()
            .find(|source| source.as_str() == lower)
            .ok_or_else(|| ParseSourceError(s.to_string()))
    }
}

/// One piece of scraped content after normalization.
///
/// `canonical_url` is the only identity used for deduplication: two items
/// with the same URL in one scan are the same entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub canonical_url: String,
    pub source: Source,
    /// Subreddit, channel, feed or account the item came from.
    pub source_name: String,
    pub title: String,
    /// Empty for link-only items.
    pub body: String,
    pub author: Option<String>,
    pub metrics: Metrics,
    pub created_at: DateTime<Utc>,
    pub fetched_at: DateTime<Utc>,
}

impl Item {
    /// Value of a metric, `0` when the platform did not report it.
    #[must_use]
    pub fn metric(&self, key: &str) -> i64 {
        self.metrics.get(key).copied().unwrap_or(0)
    }

    /// Title and body joined with a single space, as matched by the scorer.
    #[must_use]
    pub fn searchable_text(&self) -> String {
        if self.body.is_empty() {
            self.title.clone()
        } else {
            format!("{} {}", self.title, self.body)
        }
    }
}
