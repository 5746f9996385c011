use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadscan_core::{MonitoredSource, ScanConfig, Source};
use leadscan_digest::{
    run_scan, JsonFileStore, Ledger, LedgerStore, MemoryStore, ScanError, ScanOptions,
    SourceReport, SourceStatus,
};
use leadscan_sources::{FetchError, Fetcher, RawRecord, RedditPost};

const LEAD_URL: &str = "https://reddit.com/r/smallbusiness/comments/abc123/need_help";

struct StaticFetcher {
    label: String,
    records: Vec<RawRecord>,
}

#[async_trait]
impl Fetcher for StaticFetcher {
    fn source(&self) -> Source {
        Source::Reddit
    }

    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        Ok(self.records.clone())
    }
}

struct FailingFetcher;

#[async_trait]
impl Fetcher for FailingFetcher {
    fn source(&self) -> Source {
        Source::Github
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        Err(FetchError::UnexpectedStatus {
            status: 502,
            url: "https://api.github.com/search/repositories".to_string(),
        })
    }
}

struct SlowFetcher;

#[async_trait]
impl Fetcher for SlowFetcher {
    fn source(&self) -> Source {
        Source::Youtube
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok(Vec::new())
    }
}

struct PanickingFetcher;

#[async_trait]
impl Fetcher for PanickingFetcher {
    fn source(&self) -> Source {
        Source::Rss
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        panic!("feed parser blew up");
    }
}

fn post(permalink: &str, title: &str, upvotes: i64) -> RawRecord {
    RawRecord::Reddit(RedditPost {
        id: Some("abc123".to_string()),
        title: Some(title.to_string()),
        selftext: Some(String::new()),
        author: Some("founder".to_string()),
        permalink: Some(permalink.to_string()),
        subreddit: Some("smallbusiness".to_string()),
        score: Some(upvotes),
        num_comments: Some(0),
        created_utc: Some(1_700_000_000.0),
    })
}

fn lead(upvotes: i64) -> RawRecord {
    post(
        "/r/smallbusiness/comments/abc123/need_help",
        "How do I automate my invoice process?",
        upvotes,
    )
}

fn reddit(records: Vec<RawRecord>) -> Box<dyn Fetcher> {
    Box::new(StaticFetcher {
        label: "reddit".to_string(),
        records,
    })
}

fn config() -> ScanConfig {
    ScanConfig {
        keywords: vec!["automate".to_string(), "invoice".to_string()],
        monitored: vec![MonitoredSource {
            source: Source::Reddit,
            name: Some("smallbusiness".to_string()),
        }],
        ..ScanConfig::default()
    }
}

fn options_at(scan_time: DateTime<Utc>) -> ScanOptions {
    ScanOptions {
        scan_time: Some(scan_time),
        ..ScanOptions::default()
    }
}

fn status_of<'a>(sources: &'a [SourceReport], source: Source) -> &'a SourceStatus {
    &sources
        .iter()
        .find(|r| r.source == source)
        .unwrap_or_else(|| panic!("no report for {source}"))
        .status
}

#[tokio::test]
async fn new_item_lands_in_digest_and_ledger() {
    let store = MemoryStore::default();
    let now = Utc::now();

    let outcome = run_scan(vec![reddit(vec![lead(12)])], &config(), &store, &options_at(now))
        .await
        .unwrap();

    assert!(outcome.report.persisted);
    assert_eq!(outcome.report.counts.new_items, 1);
    let items: Vec<_> = outcome.digest.group_items(Source::Reddit).collect();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].url(), LEAD_URL);
    assert!(items[0].is_new);
    assert!(!items[0].discovery);
    assert_eq!(items[0].keyword_matches, 2);
    assert_eq!(items[0].engagement, 12);

    let ledger = store.snapshot();
    let entry = ledger.lookup(LEAD_URL).unwrap();
    assert_eq!(entry.first_seen, now);
    assert_eq!(entry.last_engagement, 12);
}

#[tokio::test]
async fn duplicate_url_in_one_scan_keeps_the_later_observation() {
    let store = MemoryStore::default();
    let fetchers = vec![reddit(vec![lead(10), lead(20)])];

    let outcome = run_scan(fetchers, &config(), &store, &ScanOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.digest.entries.len(), 1);
    assert_eq!(outcome.digest.entries[0].scored.engagement, 20);
    assert!(outcome.digest.entries[0].scored.hot.is_none());
    assert_eq!(outcome.report.counts.duplicates, 1);
    assert_eq!(outcome.report.counts.new_items, 1);
    assert_eq!(store.snapshot().lookup(LEAD_URL).unwrap().last_engagement, 20);
}

#[tokio::test]
async fn engagement_jump_is_hot_once() {
    let store = MemoryStore::default();
    let cfg = config();
    let opts = ScanOptions::default();

    let first = run_scan(vec![reddit(vec![lead(100)])], &cfg, &store, &opts)
        .await
        .unwrap();
    assert!(first.digest.hot.is_empty());
    assert_eq!(first.report.counts.new_items, 1);

    let second = run_scan(vec![reddit(vec![lead(160)])], &cfg, &store, &opts)
        .await
        .unwrap();
    let hot: Vec<_> = second.digest.hot_items().collect();
    assert_eq!(hot.len(), 1);
    let flag = hot[0].hot.as_ref().unwrap();
    assert_eq!(flag.old_engagement, 100);
    assert_eq!(flag.new_engagement, 160);
    assert!(!hot[0].is_new);
    assert_eq!(second.report.counts.new_items, 0);

    let third = run_scan(vec![reddit(vec![lead(161)])], &cfg, &store, &opts)
        .await
        .unwrap();
    assert!(third.digest.hot.is_empty());
    assert_eq!(third.report.counts.hot_items, 0);
    assert_eq!(store.snapshot().lookup(LEAD_URL).unwrap().last_engagement, 161);
}

#[tokio::test]
async fn expired_entry_is_pruned_before_the_item_is_seen_again() {
    let now = Utc::now();
    let mut ledger = Ledger::new();
    ledger.record(LEAD_URL, 10, now - chrono::Duration::days(8));
    let store = MemoryStore::new(ledger);

    let outcome = run_scan(vec![reddit(vec![lead(100)])], &config(), &store, &options_at(now))
        .await
        .unwrap();

    assert_eq!(outcome.report.counts.pruned, 1);
    let entry = &outcome.digest.entries[0].scored;
    assert!(entry.is_new);
    assert!(entry.hot.is_none());
    assert_eq!(store.snapshot().lookup(LEAD_URL).unwrap().first_seen, now);
}

#[tokio::test]
async fn failed_and_slow_sources_do_not_abort_the_scan() {
    let store = MemoryStore::default();
    let fetchers: Vec<Box<dyn Fetcher>> = vec![
        reddit(vec![lead(5)]),
        Box::new(FailingFetcher),
        Box::new(SlowFetcher),
        Box::new(PanickingFetcher),
    ];
    let options = ScanOptions {
        source_timeout: Duration::from_millis(50),
        disabled: vec![Source::Twitter],
        ..ScanOptions::default()
    };

    let outcome = run_scan(fetchers, &config(), &store, &options).await.unwrap();
    let sources = &outcome.report.sources;

    assert_eq!(status_of(sources, Source::Reddit), &SourceStatus::Ok { items: 1 });
    assert!(matches!(
        status_of(sources, Source::Github),
        SourceStatus::Failed { reason } if reason.contains("502")
    ));
    assert_eq!(status_of(sources, Source::Youtube), &SourceStatus::TimedOut);
    assert!(matches!(status_of(sources, Source::Rss), SourceStatus::Failed { .. }));
    assert_eq!(status_of(sources, Source::Twitter), &SourceStatus::Disabled);
    assert_eq!(outcome.digest.entries.len(), 1);
    assert!(outcome.report.persisted);
}

#[tokio::test]
async fn save_failure_still_returns_the_digest() {
    let store = MemoryStore::failing_saves(Ledger::new());

    let outcome = run_scan(vec![reddit(vec![lead(7)])], &config(), &store, &ScanOptions::default())
        .await
        .unwrap();

    assert!(!outcome.report.persisted);
    assert_eq!(outcome.digest.entries.len(), 1);
    assert!(store.snapshot().is_empty());
}

#[tokio::test]
async fn dry_run_leaves_the_ledger_untouched() {
    let store = MemoryStore::default();
    let options = ScanOptions {
        dry_run: true,
        ..ScanOptions::default()
    };

    let outcome = run_scan(vec![reddit(vec![lead(7)])], &config(), &store, &options)
        .await
        .unwrap();

    assert!(!outcome.report.persisted);
    assert_eq!(outcome.report.counts.ledger_entries, 1);
    assert!(store.load().unwrap().is_empty());
}

#[tokio::test]
async fn filtered_items_are_still_tracked() {
    let store = MemoryStore::default();
    let offer = post(
        "/r/smallbusiness/comments/zzz999/for_hire",
        "[For Hire] I automate invoice workflows",
        40,
    );
    let unrelated = post("/r/smallbusiness/comments/yyy888/lunch", "Best lunch spots?", 3);

    let mut cfg = config();
    cfg.filters.min_keyword_matches = 1;
    let outcome = run_scan(
        vec![reddit(vec![offer, unrelated, lead(9)])],
        &cfg,
        &store,
        &ScanOptions::default(),
    )
    .await
    .unwrap();

    assert_eq!(outcome.report.counts.service_offers, 1);
    assert_eq!(outcome.report.counts.below_floor, 1);
    assert_eq!(outcome.digest.entries.len(), 1);
    assert_eq!(store.snapshot().len(), 3);
}

#[tokio::test]
async fn unmonitored_sources_are_discoveries() {
    let store = MemoryStore::default();
    let cfg = ScanConfig {
        monitored: vec![MonitoredSource {
            source: Source::Reddit,
            name: Some("saas".to_string()),
        }],
        ..config()
    };

    let outcome = run_scan(vec![reddit(vec![lead(3)])], &cfg, &store, &ScanOptions::default())
        .await
        .unwrap();

    let discoveries: Vec<_> = outcome.digest.discovery_items().collect();
    assert_eq!(discoveries.len(), 1);
    assert_eq!(discoveries[0].url(), LEAD_URL);
}

#[tokio::test]
async fn records_without_a_url_are_dropped_and_counted() {
    let store = MemoryStore::default();
    let broken = RawRecord::Reddit(RedditPost {
        title: Some("automate everything".to_string()),
        ..RedditPost::default()
    });

    let outcome = run_scan(vec![reddit(vec![broken, lead(1)])], &config(), &store, &ScanOptions::default())
        .await
        .unwrap();

    assert_eq!(outcome.report.counts.raw_records, 2);
    assert_eq!(outcome.report.counts.dropped, 1);
    assert_eq!(outcome.report.counts.normalized, 1);
}

#[tokio::test]
async fn empty_keywords_are_rejected() {
    let store = MemoryStore::default();
    let cfg = ScanConfig {
        keywords: vec!["  ".to_string()],
        ..ScanConfig::default()
    };

    let err = run_scan(vec![reddit(vec![lead(1)])], &cfg, &store, &ScanOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, ScanError::NoKeywords));
}

#[tokio::test]
async fn unreadable_ledger_starts_the_scan_empty() {
    let store = MemoryStore::failing_loads();
    let now = Utc::now();

    let outcome = run_scan(
        vec![reddit(vec![lead(100), post("/r/saas/comments/q1/crm", "CRM automate help", 4)])],
        &config(),
        &store,
        &options_at(now),
    )
    .await
    .unwrap();

    assert!(outcome.report.persisted);
    assert_eq!(outcome.report.counts.hot_items, 0);
    assert_eq!(outcome.report.counts.new_items, 2);
    assert!(outcome.digest.entries.iter().all(|e| e.scored.is_new && e.scored.hot.is_none()));

    let saved = store.snapshot();
    assert_eq!(saved.len(), 2);
    assert_eq!(saved.lookup(LEAD_URL).unwrap().first_seen, now);
}

#[tokio::test]
async fn corrupt_ledger_file_is_replaced_on_save() {
    let dir = std::env::temp_dir().join(format!("leadscan-pipeline-{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("seen_urls.json");
    std::fs::write(&path, "{\"https://reddit.com/x\": ").unwrap();
    let store = JsonFileStore::new(&path);

    let outcome = run_scan(vec![reddit(vec![lead(100)])], &config(), &store, &ScanOptions::default())
        .await
        .unwrap();

    assert!(outcome.report.persisted);
    assert!(outcome.digest.entries[0].scored.is_new);
    let reloaded = store.load().unwrap();
    assert_eq!(reloaded.len(), 1);
    assert!(reloaded.lookup(LEAD_URL).is_some());
    let _ = std::fs::remove_dir_all(&dir);
}

#[tokio::test]
async fn oversized_retention_keeps_history() {
    let now = Utc::now();
    let mut ledger = Ledger::new();
    ledger.record(LEAD_URL, 100, now - chrono::Duration::days(400));
    let store = MemoryStore::new(ledger);
    let cfg = ScanConfig {
        retention_days: u32::MAX,
        ..config()
    };

    let outcome = run_scan(vec![reddit(vec![lead(160)])], &cfg, &store, &options_at(now))
        .await
        .unwrap();

    assert_eq!(outcome.report.counts.pruned, 0);
    assert_eq!(outcome.report.counts.hot_items, 1);
}
