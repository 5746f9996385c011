//! Moltbook feed client.

use async_trait::async_trait;
use leadscan_core::{MoltbookSourceConfig, Source};
use serde::Deserialize;

use crate::error::FetchError;
use crate::fetcher::{Fetcher, HttpSettings};
use crate::http::{fetch_json, join_url};
use crate::rate_limit::RateLimiter;
use crate::types::{MoltbookPost, RawRecord};

const DEFAULT_BASE_URL: &str = "https://www.moltbook.com";

/// The feed endpoint has answered both as a bare array and wrapped in
/// `{"posts": [...]}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FeedResponse {
    Wrapped { posts: Vec<MoltbookPost> },
    Bare(Vec<MoltbookPost>),
}

impl FeedResponse {
    fn into_posts(self) -> Vec<MoltbookPost> {
        match self {
            FeedResponse::Wrapped { posts } | FeedResponse::Bare(posts) => posts,
        }
    }
}

pub struct MoltbookClient {
    client: reqwest::Client,
    settings: HttpSettings,
    limiter: RateLimiter,
    base_url: String,
    api_key: String,
    limit: u32,
}

impl MoltbookClient {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(
        config: &MoltbookSourceConfig,
        api_key: String,
        settings: HttpSettings,
        limiter: RateLimiter,
    ) -> Result<Self, FetchError> {
        Self::with_base_url(config, api_key, settings, limiter, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        config: &MoltbookSourceConfig,
        api_key: String,
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
            api_key,
            limit: config.limit.max(1),
        })
    }

    /// Hot posts from the global feed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] on HTTP failure or an unparseable response.
    pub async fn fetch_feed(&self) -> Result<Vec<MoltbookPost>, FetchError> {
        let url = join_url(&self.base_url, "api/v1/feed");
        let limit = self.limit.to_string();
        let response: FeedResponse = fetch_json(&self.settings, &self.limiter, &url, || {
            self.client
                .get(&url)
                .bearer_auth(&self.api_key)
                .query(&[("sort", "hot"), ("limit", limit.as_str())])
        })
        .await?;
        Ok(response.into_posts())
    }
}

#[async_trait]
impl Fetcher for MoltbookClient {
    fn source(&self) -> Source {
        Source::Moltbook
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let posts = self.fetch_feed().await?;
        tracing::debug!(count = posts.len(), "fetched moltbook feed");
        Ok(posts.into_iter().map(RawRecord::Moltbook).collect())
    }
}
