//! Raw record shapes as each platform reports them.
//!
//! Every field a platform may omit is optional here; the normalizers decide
//! what is required.

use chrono::{DateTime, Utc};
use leadscan_core::Source;
use serde::{Deserialize, Serialize};

/// One post from a Reddit JSON listing (`children[].data`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RedditPost {
    pub id: Option<String>,
    pub title: Option<String>,
    pub selftext: Option<String>,
    pub author: Option<String>,
    pub permalink: Option<String>,
    pub subreddit: Option<String>,
    pub score: Option<i64>,
    pub num_comments: Option<i64>,
    pub created_utc: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TweetMetrics {
    #[serde(default)]
    pub like_count: i64,
    #[serde(default)]
    pub retweet_count: i64,
    #[serde(default)]
    pub reply_count: i64,
}

/// A tweet from the v2 user timeline endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tweet {
    pub id: String,
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub public_metrics: Option<TweetMetrics>,
}

/// A tweet together with the handle whose timeline it came from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TwitterRecord {
    pub username: String,
    pub tweet: Tweet,
}

/// An RSS `<item>` or Atom `<entry>`, including `YouTube` channel feeds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub feed_name: String,
    pub id: Option<String>,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub author: Option<String>,
    pub published: Option<DateTime<Utc>>,
    /// `YouTube` exposes a view count through `media:statistics`.
    pub views: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MoltbookPost {
    pub id: Option<String>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub author: Option<String>,
    pub submolt: Option<String>,
    pub upvotes: Option<i64>,
    #[serde(alias = "comments")]
    pub comment_count: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubOwner {
    pub login: String,
}

/// A repository from the GitHub search API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubRepo {
    pub id: i64,
    #[serde(default)]
    pub full_name: String,
    pub html_url: Option<String>,
    pub description: Option<String>,
    pub owner: Option<GithubOwner>,
    pub stargazers_count: Option<i64>,
    pub forks_count: Option<i64>,
    pub created_at: Option<DateTime<Utc>>,
}

/// A raw record tagged with the platform it came from.
#[derive(Debug, Clone)]
pub enum RawRecord {
    Reddit(RedditPost),
    Twitter(TwitterRecord),
    /// RSS, `YouTube` and health feeds share one shape; the tag tells them apart.
    Feed { source: Source, entry: FeedEntry },
    Moltbook(MoltbookPost),
    Github(GithubRepo),
}

impl RawRecord {
    #[must_use]
    pub fn source(&self) -> Source {
        match self {
            RawRecord::Reddit(_) => Source::Reddit,
            RawRecord::Twitter(_) => Source::Twitter,
            RawRecord::Feed { source, .. } => *source,
            RawRecord::Moltbook(_) => Source::Moltbook,
            RawRecord::Github(_) => Source::Github,
        }
    }
}
