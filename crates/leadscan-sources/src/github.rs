//! GitHub repository search client.

use async_trait::async_trait;
use leadscan_core::{GithubSourceConfig, Source};
use serde::Deserialize;

use crate::error::FetchError;
use crate::fetcher::{merge_partial, Fetcher, HttpSettings};
use crate::http::{fetch_json, join_url};
use crate::rate_limit::RateLimiter;
use crate::types::{GithubRepo, RawRecord};

const DEFAULT_BASE_URL: &str = "https://api.github.com";
const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<GithubRepo>,
}

/// Runs one `search/repositories` query per configured search string,
/// sorted by stars.
pub struct GithubClient {
    client: reqwest::Client,
    settings: HttpSettings,
    limiter: RateLimiter,
    base_url: String,
    token: Option<String>,
    queries: Vec<String>,
    per_page: u32,
}

impl GithubClient {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(
        config: &GithubSourceConfig,
        token: Option<String>,
        settings: HttpSettings,
        limiter: RateLimiter,
    ) -> Result<Self, FetchError> {
        Self::with_base_url(config, token, settings, limiter, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        config: &GithubSourceConfig,
        token: Option<String>,
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
            token,
            queries: config
                .queries
                .iter()
                .map(|q| q.trim().to_string())
                .filter(|q| !q.is_empty())
                .collect(),
            per_page: config.per_page.clamp(1, MAX_PER_PAGE),
        })
    }

    /// # Errors
    ///
    /// Returns [`FetchError`] on HTTP failure or an unparseable response.
    pub async fn search(&self, query: &str) -> Result<Vec<GithubRepo>, FetchError> {
        let url = join_url(&self.base_url, "search/repositories");
        let per_page = self.per_page.to_string();
        let response: SearchResponse = fetch_json(&self.settings, &self.limiter, &url, || {
            let request = self
                .client
                .get(&url)
                .header(reqwest::header::ACCEPT, "application/vnd.github+json")
                .query(&[
                    ("q", query),
                    ("sort", "stars"),
                    ("order", "desc"),
                    ("per_page", per_page.as_str()),
                ]);
            match &self.token {
                Some(token) => request.bearer_auth(token),
                None => request,
            }
        })
        .await?;
        Ok(response.items)
    }
}

#[async_trait]
impl Fetcher for GithubClient {
    fn source(&self) -> Source {
        Source::Github
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let mut results = Vec::with_capacity(self.queries.len());
        for query in &self.queries {
            let result = self
                .search(query)
                .await
                .map(|repos| repos.into_iter().map(RawRecord::Github).collect());
            results.push((query.clone(), result));
        }
        merge_partial(Source::Github, results)
    }
}
