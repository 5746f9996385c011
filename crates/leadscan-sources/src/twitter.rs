//! Twitter/X v2 API client for tracked accounts' timelines.
//!
//! Each handle costs two requests: a username lookup for the numeric user
//! id, then the user's recent tweets (retweets and replies excluded).

use async_trait::async_trait;
use leadscan_core::{Source, TwitterSourceConfig};
use serde::Deserialize;

use crate::error::FetchError;
use crate::fetcher::{merge_partial, Fetcher, HttpSettings};
use crate::http::{fetch_json, join_url};
use crate::rate_limit::RateLimiter;
use crate::types::{RawRecord, Tweet, TwitterRecord};

const DEFAULT_BASE_URL: &str = "https://api.twitter.com";

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    detail: Option<String>,
    #[serde(default)]
    title: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    id: String,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    data: Option<UserData>,
    #[serde(default)]
    errors: Vec<ApiError>,
}

#[derive(Debug, Deserialize)]
struct TimelineResponse {
    #[serde(default)]
    data: Vec<Tweet>,
}

pub struct TwitterClient {
    client: reqwest::Client,
    settings: HttpSettings,
    limiter: RateLimiter,
    base_url: String,
    bearer_token: String,
    accounts: Vec<String>,
    max_results: u32,
}

impl TwitterClient {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(
        config: &TwitterSourceConfig,
        bearer_token: String,
        settings: HttpSettings,
        limiter: RateLimiter,
    ) -> Result<Self, FetchError> {
        Self::with_base_url(config, bearer_token, settings, limiter, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn with_base_url(
        config: &TwitterSourceConfig,
        bearer_token: String,
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
            bearer_token,
            accounts: config
                .accounts
                .iter()
                .map(|a| a.trim().trim_start_matches('@').to_string())
                .filter(|a| !a.is_empty())
                .collect(),
            // The timeline endpoint rejects values outside 5..=100.
            max_results: config.max_results.clamp(5, 100),
        })
    }

    async fn user_id(&self, username: &str) -> Result<String, FetchError> {
        let url = join_url(&self.base_url, &format!("2/users/by/username/{username}"));
        let response: UserResponse = fetch_json(&self.settings, &self.limiter, &url, || {
            self.client.get(&url).bearer_auth(&self.bearer_token)
        })
        .await?;

        match response.data {
            Some(user) => Ok(user.id),
            None => {
                let message = response
                    .errors
                    .into_iter()
                    .find_map(|e| e.detail.or(e.title))
                    .unwrap_or_else(|| format!("user {username} not found"));
                Err(FetchError::Api {
                    platform: Source::Twitter,
                    message,
                })
            }
        }
    }

    /// Recent original tweets from `username`'s timeline.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Api`] when the handle does not resolve, or
    /// another [`FetchError`] on HTTP failure.
    pub async fn fetch_account(&self, username: &str) -> Result<Vec<Tweet>, FetchError> {
        let user_id = self.user_id(username).await?;
        let url = join_url(&self.base_url, &format!("2/users/{user_id}/tweets"));
        let max_results = self.max_results.to_string();
        let timeline: TimelineResponse = fetch_json(&self.settings, &self.limiter, &url, || {
            self.client
                .get(&url)
                .bearer_auth(&self.bearer_token)
                .query(&[
                    ("max_results", max_results.as_str()),
                    ("tweet.fields", "created_at,public_metrics"),
                    ("exclude", "retweets,replies"),
                ])
        })
        .await?;
        Ok(timeline.data)
    }
}

#[async_trait]
impl Fetcher for TwitterClient {
    fn source(&self) -> Source {
        Source::Twitter
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let mut results = Vec::with_capacity(self.accounts.len());
        for username in &self.accounts {
            let result = self.fetch_account(username).await.map(|tweets| {
                tweets
                    .into_iter()
                    .map(|tweet| {
                        RawRecord::Twitter(TwitterRecord {
                            username: username.clone(),
                            tweet,
                        })
                    })
                    .collect()
            });
            results.push((username.clone(), result));
        }
        merge_partial(Source::Twitter, results)
    }
}
