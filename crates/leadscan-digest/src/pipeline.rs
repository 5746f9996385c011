//! Scan orchestration.
//!
//! Fan-out: one task per fetcher, each with its own rate limiter and a
//! whole-source timeout, sending one [`SourceBatch`] over a bounded channel.
//! Fan-in: the calling task owns the ledger and applies every observation
//! sequentially, so `prune`, `lookup` and `record` never race.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use leadscan_core::{AppConfig, Item, ScanConfig, Source};
use leadscan_sources::{normalize_batch, Fetcher, RawRecord};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::assemble::{Digest, DigestAssembler, ScoredItem};
use crate::engagement::EngagementWeights;
use crate::error::ScanError;
use crate::filters::{LeadFilter, Verdict};
use crate::hot::detect_hot;
use crate::ledger::{Ledger, LedgerEntry, LedgerStore};
use crate::ranker::SourceRanker;
use crate::scorer::KeywordScorer;

const DEFAULT_SOURCE_TIMEOUT: Duration = Duration::from_secs(120);
const DEFAULT_CHANNEL_CAPACITY: usize = 16;

/// What one fetcher task produced.
#[derive(Debug)]
pub enum BatchOutcome {
    Records(Vec<RawRecord>),
    Failed(String),
    TimedOut,
}

/// Message from a fetcher task to the ledger owner.
#[derive(Debug)]
pub struct SourceBatch {
    pub source: Source,
    pub label: String,
    pub fetched_at: DateTime<Utc>,
    pub outcome: BatchOutcome,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SourceStatus {
    Ok { items: usize },
    Failed { reason: String },
    TimedOut,
    Disabled,
}

impl fmt::Display for SourceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceStatus::Ok { items } => write!(f, "ok({items})"),
            SourceStatus::Failed { reason } => write!(f, "failed({reason})"),
            SourceStatus::TimedOut => f.write_str("timed_out"),
            SourceStatus::Disabled => f.write_str("disabled"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceReport {
    pub source: Source,
    pub label: String,
    #[serde(flatten)]
    pub status: SourceStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanCounts {
    pub raw_records: usize,
    pub normalized: usize,
    /// Records without a usable canonical URL.
    pub dropped: usize,
    /// Re-observations of a URL already seen earlier in this scan.
    pub duplicates: usize,
    pub service_offers: usize,
    /// Below `min_keyword_matches` or the source's engagement floor.
    pub below_floor: usize,
    pub new_items: usize,
    pub hot_items: usize,
    pub pruned: usize,
    pub ledger_entries: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub sources: Vec<SourceReport>,
    pub counts: ScanCounts,
    /// `false` when the ledger was not saved (dry run or write failure);
    /// history was not updated by this scan.
    pub persisted: bool,
    pub ledger_location: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanOutcome {
    pub report: ScanReport,
    pub digest: Digest,
}

#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub source_timeout: Duration,
    pub channel_capacity: usize,
    /// Skip saving the ledger.
    pub dry_run: bool,
    /// Configured sources that have no fetcher, reported as disabled.
    pub disabled: Vec<Source>,
    /// Fixed scan timestamp; the current time when `None`.
    pub scan_time: Option<DateTime<Utc>>,
}

impl ScanOptions {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            source_timeout: Duration::from_secs(config.source_timeout_secs),
            ..Self::default()
        }
    }
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            source_timeout: DEFAULT_SOURCE_TIMEOUT,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            dry_run: false,
            disabled: Vec::new(),
            scan_time: None,
        }
    }
}

/// Stateless scoring components, built fresh for every scan from the
/// configuration.
#[derive(Debug)]
pub struct Scoring {
    pub keywords: KeywordScorer,
    pub ranker: SourceRanker,
    pub weights: EngagementWeights,
    pub filter: LeadFilter,
    pub hot_threshold: f64,
}

impl Scoring {
    /// # Errors
    ///
    /// Returns [`ScanError::NoKeywords`] when the keyword list is empty.
    pub fn from_config(config: &ScanConfig) -> Result<Self, ScanError> {
        let keywords = KeywordScorer::new(&config.keywords);
        if keywords.is_empty() {
            return Err(ScanError::NoKeywords);
        }
        Ok(Self {
            keywords,
            ranker: SourceRanker::from_config(config),
            weights: EngagementWeights::from_config(config),
            filter: LeadFilter::from_config(&config.filters),
            hot_threshold: config.hot_threshold,
        })
    }
}

/// The single ledger owner for one scan.
struct ScanState<'a> {
    config: &'a ScanConfig,
    scoring: &'a Scoring,
    ledger: Ledger,
    now: DateTime<Utc>,
    /// Ledger entry per URL as it stood before this scan touched it.
    baseline: HashMap<String, Option<LedgerEntry>>,
    positions: HashMap<String, usize>,
    kept: Vec<Option<ScoredItem>>,
    counts: ScanCounts,
    statuses: BTreeMap<(Source, String), SourceStatus>,
}

impl<'a> ScanState<'a> {
    fn new(
        config: &'a ScanConfig,
        scoring: &'a Scoring,
        mut ledger: Ledger,
        now: DateTime<Utc>,
    ) -> Self {
        // Prune before any record so a stale URL re-observed now is new.
        let pruned = ledger.prune(now, config.retention());
        if pruned > 0 {
            tracing::info!(pruned, "pruned expired ledger entries");
        }
        Self {
            config,
            scoring,
            ledger,
            now,
            baseline: HashMap::new(),
            positions: HashMap::new(),
            kept: Vec::new(),
            counts: ScanCounts {
                pruned,
                ..ScanCounts::default()
            },
            statuses: BTreeMap::new(),
        }
    }

    fn apply(&mut self, batch: SourceBatch) {
        let key = (batch.source, batch.label);
        let records = match batch.outcome {
            BatchOutcome::Records(records) => records,
            BatchOutcome::Failed(reason) => {
                self.statuses.insert(key, SourceStatus::Failed { reason });
                return;
            }
            BatchOutcome::TimedOut => {
                self.statuses.insert(key, SourceStatus::TimedOut);
                return;
            }
        };

        self.counts.raw_records += records.len();
        let (items, errors) = normalize_batch(&records, batch.fetched_at);
        if !errors.is_empty() {
            for error in &errors {
                tracing::debug!(error = %error, "dropping record");
            }
            tracing::warn!(
                source = %key.0,
                dropped = errors.len(),
                "dropped records without a usable url"
            );
        }
        self.counts.dropped += errors.len();
        self.counts.normalized += items.len();

        tracing::debug!(source = %key.0, label = %key.1, items = items.len(), "applying batch");
        self.statuses
            .insert(key, SourceStatus::Ok { items: items.len() });
        for item in items {
            self.observe(item);
        }
    }

    fn observe(&mut self, item: Item) {
        let url = item.canonical_url.clone();
        let ledger = &self.ledger;
        let first_in_scan = !self.baseline.contains_key(&url);
        let prior = *self
            .baseline
            .entry(url.clone())
            .or_insert_with(|| ledger.lookup(&url).copied());
        if !first_in_scan {
            self.counts.duplicates += 1;
        }

        let scoring = self.scoring;
        let engagement = scoring.weights.engagement(&item);
        let keywords = scoring.keywords.score(&item);
        let hot = detect_hot(&url, engagement, prior.as_ref(), scoring.hot_threshold);
        let verdict = scoring.filter.check(&item, keywords.count, engagement);

        self.ledger.record(&url, engagement, self.now);

        let position = self.positions.get(&url).copied();
        if verdict != Verdict::Keep {
            match verdict {
                Verdict::ServiceOffer => self.counts.service_offers += 1,
                _ => self.counts.below_floor += 1,
            }
            // The later observation wins, including when it is filtered out.
            if let Some(i) = position {
                self.kept[i] = None;
            }
            return;
        }

        let scored = ScoredItem {
            source_score: scoring.ranker.rank(&item.source_name),
            discovery: !self.config.is_monitored(item.source, &item.source_name),
            is_new: prior.is_none(),
            keyword_matches: keywords.count,
            matched_keywords: keywords.matched,
            engagement,
            hot,
            item,
        };
        match position {
            Some(i) => self.kept[i] = Some(scored),
            None => {
                self.positions.insert(url, self.kept.len());
                self.kept.push(Some(scored));
            }
        }
    }

    fn mark_failed(&mut self, source: Source, label: String, reason: String) {
        self.statuses
            .entry((source, label))
            .or_insert(SourceStatus::Failed { reason });
    }
}

/// Run one scan: fetch every source concurrently, fold all observations into
/// the ledger, save it, and assemble the digest.
///
/// Per-record and per-source failures never abort the scan. A ledger that
/// cannot be loaded is replaced by an empty one; a ledger that cannot be
/// saved leaves `report.persisted == false`.
///
/// # Errors
///
/// Returns [`ScanError::NoKeywords`] when no keywords are configured.
pub async fn run_scan(
    fetchers: Vec<Box<dyn Fetcher>>,
    config: &ScanConfig,
    store: &dyn LedgerStore,
    options: &ScanOptions,
) -> Result<ScanOutcome, ScanError> {
    let scoring = Scoring::from_config(config)?;
    let started_at = options.scan_time.unwrap_or_else(Utc::now);

    let ledger = match store.load() {
        Ok(ledger) => ledger,
        Err(e) => {
            tracing::warn!(
                ledger = %store.location(),
                error = %e,
                "failed to load ledger; treating every item as new"
            );
            Ledger::new()
        }
    };

    tracing::info!(
        fetchers = fetchers.len(),
        ledger_entries = ledger.len(),
        "starting scan"
    );

    let mut state = ScanState::new(config, &scoring, ledger, started_at);
    for source in &options.disabled {
        state
            .statuses
            .insert((*source, source.as_str().to_string()), SourceStatus::Disabled);
    }

    let (tx, mut rx) = mpsc::channel::<SourceBatch>(options.channel_capacity.max(1));
    let mut tasks = Vec::with_capacity(fetchers.len());
    for fetcher in fetchers {
        let source = fetcher.source();
        let label = fetcher.label().to_string();
        let tx = tx.clone();
        let timeout = options.source_timeout;
        let task_label = label.clone();
        let handle = tokio::spawn(async move {
            let outcome = match tokio::time::timeout(timeout, fetcher.fetch()).await {
                Ok(Ok(records)) => BatchOutcome::Records(records),
                Ok(Err(e)) => {
                    tracing::warn!(source = %source, label = %task_label, error = %e, "source fetch failed");
                    BatchOutcome::Failed(e.to_string())
                }
                Err(_) => {
                    tracing::warn!(
                        source = %source,
                        label = %task_label,
                        timeout_secs = timeout.as_secs(),
                        "source fetch timed out"
                    );
                    BatchOutcome::TimedOut
                }
            };
            let batch = SourceBatch {
                source,
                label: task_label,
                fetched_at: Utc::now(),
                outcome,
            };
            if tx.send(batch).await.is_err() {
                tracing::debug!(source = %source, "scan receiver closed before batch was sent");
            }
        });
        tasks.push((source, label, handle));
    }
    drop(tx);

    while let Some(batch) = rx.recv().await {
        state.apply(batch);
    }

    let (keys, handles): (Vec<_>, Vec<_>) = tasks
        .into_iter()
        .map(|(source, label, handle)| ((source, label), handle))
        .unzip();
    for ((source, label), result) in keys.into_iter().zip(join_all(handles).await) {
        if let Err(e) = result {
            tracing::error!(source = %source, label = %label, error = %e, "fetch task panicked");
            state.mark_failed(source, label, format!("fetch task failed: {e}"));
        }
    }

    Ok(finish(state, store, options, started_at))
}

fn finish(
    state: ScanState<'_>,
    store: &dyn LedgerStore,
    options: &ScanOptions,
    started_at: DateTime<Utc>,
) -> ScanOutcome {
    let ScanState {
        config,
        ledger,
        kept,
        mut counts,
        statuses,
        ..
    } = state;

    let persisted = if options.dry_run {
        tracing::info!("dry run; ledger not saved");
        false
    } else {
        match store.save(&ledger) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    ledger = %store.location(),
                    error = %e,
                    "failed to save ledger; digest is not persisted"
                );
                false
            }
        }
    };

    let items: Vec<ScoredItem> = kept.into_iter().flatten().collect();
    counts.new_items = items.iter().filter(|i| i.is_new).count();
    counts.hot_items = items.iter().filter(|i| i.hot.is_some()).count();
    counts.ledger_entries = ledger.len();

    let finished_at = Utc::now().max(started_at);
    let digest = DigestAssembler::from_config(config).assemble(items, finished_at);

    let sources: Vec<SourceReport> = statuses
        .into_iter()
        .map(|((source, label), status)| SourceReport {
            source,
            label,
            status,
        })
        .collect();

    tracing::info!(
        normalized = counts.normalized,
        dropped = counts.dropped,
        new = counts.new_items,
        hot = counts.hot_items,
        persisted,
        "scan complete"
    );

    ScanOutcome {
        report: ScanReport {
            started_at,
            finished_at,
            sources,
            counts,
            persisted,
            ledger_location: store.location(),
        },
        digest,
    }
}
