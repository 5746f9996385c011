//! Request helpers shared by the platform clients.

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;

use crate::error::FetchError;
use crate::fetcher::HttpSettings;
use crate::rate_limit::{retry_with_backoff, RateLimiter};

/// Send a request built by `build`, pacing through `limiter` and retrying
/// transient failures. Returns the response body on 2xx.
pub(crate) async fn fetch_text<F>(
    settings: &HttpSettings,
    limiter: &RateLimiter,
    url: &str,
    build: F,
) -> Result<String, FetchError>
where
    F: Fn() -> RequestBuilder,
{
    let build = &build;
    retry_with_backoff(settings.max_retries, settings.retry_backoff_base_ms, || async move {
        limiter.wait().await;
        let response = build().send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.trim().parse::<u64>().ok())
                .unwrap_or(0);
            return Err(FetchError::RateLimited {
                url: url.to_string(),
                retry_after_secs,
            });
        }

        if !status.is_success() {
            return Err(FetchError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.text().await?)
    })
    .await
}

/// Like [`fetch_text`], then deserialize the body as JSON.
pub(crate) async fn fetch_json<T, F>(
    settings: &HttpSettings,
    limiter: &RateLimiter,
    url: &str,
    build: F,
) -> Result<T, FetchError>
where
    T: DeserializeOwned,
    F: Fn() -> RequestBuilder,
{
    let body = fetch_text(settings, limiter, url, build).await?;
    serde_json::from_str(&body).map_err(|e| FetchError::Deserialize {
        context: url.to_string(),
        source: e,
    })
}

/// Join `path` onto `base_url`, tolerating a trailing slash on the base.
pub(crate) fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
