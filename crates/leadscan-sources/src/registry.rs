//! Builds the set of enabled fetchers from configuration.

use leadscan_core::{
    AppConfig, ScanConfig, Source, MOLTBOOK_API_KEY_VAR, TWITTER_BEARER_TOKEN_VAR,
};

use crate::error::FetchError;
use crate::feed::FeedClient;
use crate::fetcher::{Fetcher, HttpSettings};
use crate::github::GithubClient;
use crate::moltbook::MoltbookClient;
use crate::rate_limit::RateLimiter;
use crate::reddit::RedditClient;
use crate::twitter::TwitterClient;

/// One fetcher per configured source, in [`Source::ALL`] order.
///
/// Sources missing from the `sources` section are skipped. Twitter and
/// Moltbook additionally need their API credential; without it they are
/// skipped with a warning. Each fetcher gets its own [`RateLimiter`].
///
/// # Errors
///
/// Returns [`FetchError::Http`] if an HTTP client cannot be built.
pub fn build_fetchers(
    app: &AppConfig,
    scan: &ScanConfig,
) -> Result<Vec<Box<dyn Fetcher>>, FetchError> {
    let settings = HttpSettings::from_app_config(app);
    let limiter = |source: Source| RateLimiter::new(scan.rate_limit.delay_for(source));
    let sources = &scan.sources;
    let mut fetchers: Vec<Box<dyn Fetcher>> = Vec::new();

    if let Some(reddit) = &sources.reddit {
        if !reddit.subreddits.is_empty() {
            fetchers.push(Box::new(RedditClient::new(
                reddit,
                settings.clone(),
                limiter(Source::Reddit),
            )?));
        }
    }

    if let Some(twitter) = &sources.twitter {
        match &app.twitter_bearer_token {
            Some(token) if !twitter.accounts.is_empty() => {
                fetchers.push(Box::new(TwitterClient::new(
                    twitter,
                    token.clone(),
                    settings.clone(),
                    limiter(Source::Twitter),
                )?));
            }
            Some(_) => {}
            None => tracing::warn!(
                source = %Source::Twitter,
                env_var = TWITTER_BEARER_TOKEN_VAR,
                "twitter is configured but its bearer token is not set; skipping"
            ),
        }
    }

    if !sources.youtube.is_empty() {
        let targets = FeedClient::youtube_targets(&sources.youtube, "");
        fetchers.push(Box::new(FeedClient::new(
            Source::Youtube,
            targets,
            settings.clone(),
            limiter(Source::Youtube),
        )?));
    }

    if let Some(moltbook) = &sources.moltbook {
        match &app.moltbook_api_key {
            Some(key) => fetchers.push(Box::new(MoltbookClient::new(
                moltbook,
                key.clone(),
                settings.clone(),
                limiter(Source::Moltbook),
            )?)),
            None => tracing::warn!(
                source = %Source::Moltbook,
                env_var = MOLTBOOK_API_KEY_VAR,
                "moltbook is configured but its api key is not set; skipping"
            ),
        }
    }

    for source in [Source::Rss, Source::Health] {
        let targets = FeedClient::targets_for(&sources.rss, source);
        if !targets.is_empty() {
            fetchers.push(Box::new(FeedClient::new(
                source,
                targets,
                settings.clone(),
                limiter(source),
            )?));
        }
    }

    if let Some(github) = &sources.github {
        if !github.queries.is_empty() {
            fetchers.push(Box::new(GithubClient::new(
                github,
                app.github_token.clone(),
                settings.clone(),
                limiter(Source::Github),
            )?));
        }
    }

    tracing::debug!(count = fetchers.len(), "built fetchers");
    Ok(fetchers)
}

/// Sources that are configured but produce no fetcher (for the scan report).
#[must_use]
pub fn disabled_sources(app: &AppConfig, scan: &ScanConfig) -> Vec<Source> {
    let mut disabled = Vec::new();
    if scan.sources.twitter.is_some() && app.twitter_bearer_token.is_none() {
        disabled.push(Source::Twitter);
    }
    if scan.sources.moltbook.is_some() && app.moltbook_api_key.is_none() {
        disabled.push(Source::Moltbook);
    }
    disabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use leadscan_core::{
        Environment, FeedConfig, MoltbookSourceConfig, RedditSourceConfig, TwitterSourceConfig,
    };
    use std::path::PathBuf;

    fn app_config() -> AppConfig {
        AppConfig {
            env: Environment::Test,
            log_level: "info".to_string(),
            scan_config_path: PathBuf::from("config/scan.yaml"),
            ledger_path: PathBuf::from("data/seen_urls.json"),
            user_agent: "leadscan-test".to_string(),
            request_timeout_secs: 5,
            source_timeout_secs: 30,
            max_retries: 0,
            retry_backoff_base_ms: 0,
            twitter_bearer_token: None,
            moltbook_api_key: None,
            github_token: None,
        }
    }

    fn scan_config() -> ScanConfig {
        let mut scan = ScanConfig::default();
        scan.sources.reddit = Some(RedditSourceConfig {
            subreddits: vec!["entrepreneur".to_string()],
            ..RedditSourceConfig::default()
        });
        scan.sources.rss = vec![
            FeedConfig {
                name: "news".to_string(),
                url: "https://news.example.com/feed".to_string(),
                source: None,
            },
            FeedConfig {
                name: "health".to_string(),
                url: "https://health.example.com/feed".to_string(),
                source: Some(Source::Health),
            },
        ];
        scan.sources.twitter = Some(TwitterSourceConfig {
            accounts: vec!["levelsio".to_string()],
            ..TwitterSourceConfig::default()
        });
        scan.sources.moltbook = Some(MoltbookSourceConfig::default());
        scan
    }

    #[test]
    fn credentialless_sources_are_skipped() {
        let fetchers = build_fetchers(&app_config(), &scan_config()).unwrap();
        let sources: Vec<Source> = fetchers.iter().map(|f| f.source()).collect();
        assert_eq!(sources, vec![Source::Reddit, Source::Rss, Source::Health]);
        assert_eq!(
            disabled_sources(&app_config(), &scan_config()),
            vec![Source::Twitter, Source::Moltbook]
        );
    }

    #[test]
    fn credentials_enable_token_sources() {
        let mut app = app_config();
        app.twitter_bearer_token = Some("bearer".to_string());
        app.moltbook_api_key = Some("key".to_string());
        let fetchers = build_fetchers(&app, &scan_config()).unwrap();
        let sources: Vec<Source> = fetchers.iter().map(|f| f.source()).collect();
        assert_eq!(
            sources,
            vec![
                Source::Reddit,
                Source::Twitter,
                Source::Moltbook,
                Source::Rss,
                Source::Health
            ]
        );
        assert!(disabled_sources(&app, &scan_config()).is_empty());
    }

    #[test]
    fn empty_config_builds_nothing() {
        let fetchers = build_fetchers(&app_config(), &ScanConfig::default()).unwrap();
        assert!(fetchers.is_empty());
    }
}
