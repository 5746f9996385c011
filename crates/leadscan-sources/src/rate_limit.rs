//! Per-source request pacing and retry utilities.
//!
//! Every fetcher owns one [`RateLimiter`] that enforces a minimum delay between
//! its own requests. [`retry_with_backoff`] wraps a single request and retries
//! transient failures (network errors, 429, 5xx) with jittered exponential
//! backoff. Everything else is returned immediately.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::FetchError;

/// Enforces a minimum delay between consecutive requests to one source.
#[derive(Debug)]
pub struct RateLimiter {
    min_delay: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            last_request: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    /// Sleep until at least `min_delay` has passed since the previous call
    /// returned. The first call never sleeps.
    pub async fn wait(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_delay {
                tokio::time::sleep(self.min_delay - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Returns `true` for errors that are worth retrying after a backoff delay.
///
/// Retriable: timeouts, connection failures, HTTP 429 and 5xx.
/// Not retriable: other HTTP statuses, malformed JSON/XML, API-level errors.
pub(crate) fn is_retriable(err: &FetchError) -> bool {
    match err {
        FetchError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        FetchError::RateLimited { .. } => true,
        FetchError::UnexpectedStatus { status, .. } => *status >= 500,
        FetchError::Deserialize { .. } | FetchError::Xml(_) | FetchError::Api { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// Sleeps `backoff_base_ms * 2^attempt` milliseconds, ±25% jitter, capped at
/// 60 s, between attempts. A `RateLimited` error's `retry_after_secs` is used
/// as a floor for the delay.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_retriable(&err) || attempt >= max_retries {
            return Err(err);
        }

        let exp = backoff_base_ms.saturating_mul(1u64 << attempt.min(20));
        let jitter: f64 = rand::rng().random_range(0.75..=1.25);
        #[allow(
            clippy::cast_possible_truncation,
            clippy::cast_sign_loss,
            clippy::cast_precision_loss
        )]
        let mut delay_ms = ((exp as f64) * jitter) as u64;
        if let FetchError::RateLimited {
            retry_after_secs, ..
        } = &err
        {
            delay_ms = delay_ms.max(retry_after_secs.saturating_mul(1_000));
        }
        let delay_ms = delay_ms.min(MAX_DELAY_MS);

        tracing::warn!(
            attempt,
            max_retries,
            delay_ms,
            error = %err,
            "transient fetch error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_millis(delay_ms)).await;
        attempt += 1;
    }
}
