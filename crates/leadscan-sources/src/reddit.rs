//! Reddit public JSON listing client (no OAuth).

use async_trait::async_trait;
use leadscan_core::{RedditSourceConfig, Source};
use serde::Deserialize;

use crate::error::FetchError;
use crate::fetcher::{merge_partial, Fetcher, HttpSettings};
use crate::http::{fetch_json, join_url};
use crate::rate_limit::RateLimiter;
use crate::types::{RawRecord, RedditPost};

const DEFAULT_BASE_URL: &str = "https://www.reddit.com";
const MAX_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: RedditPost,
}

/// Fetches `/r/{subreddit}/{sort}.json` for each configured subreddit.
pub struct RedditClient {
    client: reqwest::Client,
    settings: HttpSettings,
    limiter: RateLimiter,
    base_url: String,
    subreddits: Vec<String>,
    sort: String,
    limit: u32,
}

impl RedditClient {
    /// Creates a client pointed at `www.reddit.com`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(
        config: &RedditSourceConfig,
        settings: HttpSettings,
        limiter: RateLimiter,
    ) -> Result<Self, FetchError> {
        Self::with_base_url(config, settings, limiter, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        config: &RedditSourceConfig,
        settings: HttpSettings,
        limiter: RateLimiter,
        base_url: &str,
    ) -> Result<Self, FetchError> {
        let client = settings.build_client()?;
        Ok(Self {
            client,
            settings,
            limiter,
            base_url: base_url.to_string(),
            subreddits: config
                .subreddits
                .iter()
                .map(|s| s.trim().trim_start_matches("r/").to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            sort: config.sort.clone(),
            limit: config.limit.clamp(1, MAX_LIMIT),
        })
    }

    /// Fetch one listing page for `subreddit`.
    ///
    /// Posts without a `subreddit` field inherit the requested name.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on HTTP failure or an unparseable listing.
    pub async fn fetch_subreddit(&self, subreddit: &str) -> Result<Vec<RedditPost>, FetchError> {
        let url = join_url(&self.base_url, &format!("r/{subreddit}/{}.json", self.sort));
        let limit = self.limit.to_string();
        let listing: Listing = fetch_json(&self.settings, &self.limiter, &url, || {
            self.client
                .get(&url)
                .query(&[("limit", limit.as_str()), ("raw_json", "1")])
        })
        .await?;

        Ok(listing
            .data
            .children
            .into_iter()
            .map(|child| {
                let mut post = child.data;
                if post.subreddit.as_deref().is_none_or(str::is_empty) {
                    post.subreddit = Some(subreddit.to_string());
                }
                post
            })
            .collect())
    }
}

#[async_trait]
impl Fetcher for RedditClient {
    fn source(&self) -> Source {
        Source::Reddit
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let mut results = Vec::with_capacity(self.subreddits.len());
        for subreddit in &self.subreddits {
            let result = self
                .fetch_subreddit(subreddit)
                .await
                .map(|posts| posts.into_iter().map(RawRecord::Reddit).collect());
            results.push((subreddit.clone(), result));
        }
        merge_partial(Source::Reddit, results)
    }
}
