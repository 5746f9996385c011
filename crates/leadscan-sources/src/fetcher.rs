//! The capability every platform client implements.

use std::time::Duration;

use async_trait::async_trait;
use leadscan_core::{AppConfig, Source};

use crate::error::FetchError;
use crate::types::RawRecord;

/// A read-only, network-bound producer of raw records for one source.
///
/// Implementations pace their own requests and continue past failures of
/// individual sub-sources (one subreddit, one feed). They return an error
/// only when nothing at all could be fetched.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Platform tag of every record this fetcher returns.
    fn source(&self) -> Source;

    /// Label used in logs and the scan report.
    fn label(&self) -> &str {
        self.source().as_str()
    }

    /// Fetch one scan's worth of raw records.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError`] when every request for this source failed.
    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError>;
}

/// HTTP behaviour shared by all platform clients.
#[derive(Debug, Clone)]
pub struct HttpSettings {
    pub user_agent: String,
    pub request_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl HttpSettings {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            user_agent: config.user_agent.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
        }
    }

    /// Build a `reqwest::Client` with this user agent and timeout.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the client cannot be constructed.
    pub fn build_client(&self) -> Result<reqwest::Client, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .connect_timeout(Duration::from_secs(10))
            .user_agent(&self.user_agent)
            .build()?;
        Ok(client)
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            user_agent: "leadscan/0.1 (lead-digest)".to_string(),
            request_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_backoff_base_ms: 1_000,
        }
    }
}

/// Collect per-sub-source results into one batch.
///
/// Failures are logged; an error is returned only when every sub-source
/// failed and nothing was collected.
pub(crate) fn merge_partial(
    source: Source,
    results: Vec<(String, Result<Vec<RawRecord>, FetchError>)>,
) -> Result<Vec<RawRecord>, FetchError> {
    let mut records = Vec::new();
    let mut first_error = None;
    let mut failures = 0usize;
    let attempted = results.len();

    for (target, result) in results {
        match result {
            Ok(batch) => {
                tracing::debug!(source = %source, target = %target, count = batch.len(), "fetched");
                records.extend(batch);
            }
            Err(e) => {
                tracing::warn!(source = %source, target = %target, error = %e, "fetch failed");
                failures += 1;
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(err) if failures == attempted => Err(err),
        _ => Ok(records),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RedditPost;

    fn not_found(url: &str) -> FetchError {
        FetchError::UnexpectedStatus {
            status: 404,
            url: url.to_string(),
        }
    }

    #[test]
    fn partial_failure_keeps_successful_records() {
        let results = vec![
            (
                "entrepreneur".to_string(),
                Ok(vec![RawRecord::Reddit(RedditPost::default())]),
            ),
            ("missing".to_string(), Err(not_found("https://x/missing"))),
        ];
        let records = merge_partial(Source::Reddit, results).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn total_failure_returns_first_error() {
        let results = vec![
            ("a".to_string(), Err(not_found("https://x/a"))),
            ("b".to_string(), Err(not_found("https://x/b"))),
        ];
        let err = merge_partial(Source::Rss, results).unwrap_err();
        assert!(err.to_string().contains("https://x/a"));
    }

    #[test]
    fn empty_target_list_is_not_an_error() {
        let records = merge_partial(Source::Github, Vec::new()).unwrap();
        assert!(records.is_empty());
    }
}
