//! Integration tests for the token-authenticated API clients.

use std::time::Duration;

use leadscan_core::{GithubSourceConfig, MoltbookSourceConfig, Source, TwitterSourceConfig};
use leadscan_sources::github::GithubClient;
use leadscan_sources::moltbook::MoltbookClient;
use leadscan_sources::twitter::TwitterClient;
use leadscan_sources::{normalize_batch, FetchError, Fetcher, HttpSettings, RateLimiter};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings() -> HttpSettings {
    HttpSettings {
        user_agent: "leadscan-test".to_string(),
        request_timeout: Duration::from_secs(5),
        max_retries: 0,
        retry_backoff_base_ms: 0,
    }
}

fn limiter() -> RateLimiter {
    RateLimiter::new(Duration::ZERO)
}

#[tokio::test]
async fn github_search_sends_query_and_token() {
    let server = MockServer::start().await;

    let body = serde_json::json!({
        "total_count": 1,
        "items": [{
            "id": 42,
            "full_name": "acme/invoice-bot",
            "html_url": "https://github.com/acme/invoice-bot",
            "description": "Automates invoicing",
            "owner": { "login": "acme" },
            "stargazers_count": 310,
            "forks_count": 12,
            "created_at": "2025-05-01T00:00:00Z"
        }]
    });

    Mock::given(method("GET"))
        .and(path("/search/repositories"))
        .and(query_param("q", "invoice automation"))
        .and(query_param("sort", "stars"))
        .and(query_param("per_page", "20"))
        .and(header("authorization", "Bearer gh-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .mount(&server)
        .await;

    let config = GithubSourceConfig {
        queries: vec!["invoice automation".to_string()],
        per_page: 20,
    };
    let client = GithubClient::with_base_url(
        &config,
        Some("gh-token".to_string()),
        settings(),
        limiter(),
        &server.uri(),
    )
    .expect("client construction should not fail");

    let records = client.fetch().await.expect("search should parse");
    let (items, errors) = normalize_batch(&records, chrono::Utc::now());
    assert!(errors.is_empty());
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].source, Source::Github);
    assert_eq!(items[0].canonical_url, "https://github.com/acme/invoice-bot");
}

#[tokio::test]
async fn twitter_resolves_user_then_reads_timeline() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/users/by/username/levelsio"))
        .and(header("authorization", "Bearer tw-token"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "id": "1001", "name": "Pieter", "username": "levelsio" }
            })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/2/users/1001/tweets"))
        .and(query_param("max_results", "10"))
        .and(query_param("exclude", "retweets,replies"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{
                    "id": "1800000000000",
                    "text": "Launching my new SaaS for agencies",
                    "created_at": "2025-06-09T15:00:00.000Z",
                    "public_metrics": {
                        "like_count": 120,
                        "retweet_count": 8,
                        "reply_count": 30,
                        "quote_count": 2
                    }
                }]
            })),
        )
        .mount(&server)
        .await;

    let config = TwitterSourceConfig {
        accounts: vec!["@levelsio".to_string()],
        max_results: 10,
    };
    let client = TwitterClient::with_base_url(
        &config,
        "tw-token".to_string(),
        settings(),
        limiter(),
        &server.uri(),
    )
    .expect("client construction should not fail");

    let records = client.fetch().await.expect("timeline should parse");
    let (items, _) = normalize_batch(&records, chrono::Utc::now());
    assert_eq!(items.len(), 1);
    assert_eq!(
        items[0].canonical_url,
        "https://twitter.com/levelsio/status/1800000000000"
    );
    assert_eq!(items[0].metric("likes"), 120);
}

#[tokio::test]
async fn twitter_unknown_user_is_an_api_error() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2/users/by/username/ghost"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "errors": [{ "title": "Not Found Error", "detail": "Could not find user with username: [ghost]." }]
            })),
        )
        .mount(&server)
        .await;

    let config = TwitterSourceConfig {
        accounts: vec!["ghost".to_string()],
        max_results: 10,
    };
    let client = TwitterClient::with_base_url(
        &config,
        "tw-token".to_string(),
        settings(),
        limiter(),
        &server.uri(),
    )
    .expect("client construction should not fail");

    let err = client.fetch().await.unwrap_err();
    match err {
        FetchError::Api { platform, message } => {
            assert_eq!(platform, Source::Twitter);
            assert!(message.contains("ghost"));
        }
        other => panic!("expected api error, got {other:?}"),
    }
}

#[tokio::test]
async fn moltbook_accepts_wrapped_and_bare_feeds() {
    let post = serde_json::json!({
        "id": "p-77",
        "title": "Built an agent that books my calls",
        "content": "Happy to share the workflow",
        "author": "clawd",
        "submolt": "builds",
        "upvotes": 9,
        "comments": 4
    });

    for body in [
        serde_json::json!({ "posts": [post.clone()] }),
        serde_json::json!([post.clone()]),
    ] {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/feed"))
            .and(query_param("sort", "hot"))
            .and(header("authorization", "Bearer mb-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(&body))
            .mount(&server)
            .await;

        let client = MoltbookClient::with_base_url(
            &MoltbookSourceConfig { limit: 50 },
            "mb-key".to_string(),
            settings(),
            limiter(),
            &server.uri(),
        )
        .expect("client construction should not fail");

        let posts = client.fetch_feed().await.expect("feed should parse");
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].comment_count, Some(4));
    }
}
