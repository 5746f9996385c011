//! Scoring, history, and digest assembly for scanned leads.
//!
//! [`run_scan`] is the entry point: it fans out the configured fetchers,
//! scores every normalized item, tracks it in the [`Ledger`], and returns a
//! [`Digest`] plus a [`ScanReport`].

pub mod assemble;
pub mod engagement;
pub mod error;
pub mod filters;
pub mod hot;
pub mod ledger;
pub mod pipeline;
pub mod ranker;
pub mod scorer;

pub use assemble::{Digest, DigestAssembler, DigestEntry, Membership, ScoredItem, SourceGroup};
pub use engagement::{EngagementFn, EngagementWeights};
pub use error::{LedgerIoError, ScanError};
pub use filters::{is_service_offer, LeadFilter, Verdict};
pub use hot::{detect_hot, HotFlag, DEFAULT_HOT_THRESHOLD};
pub use ledger::{JsonFileStore, Ledger, LedgerEntry, LedgerStats, LedgerStore, MemoryStore};
pub use pipeline::{
    run_scan, BatchOutcome, ScanCounts, ScanOptions, ScanOutcome, ScanReport, Scoring,
    SourceBatch, SourceReport, SourceStatus,
};
pub use ranker::{SourceRanker, SourceScore};
pub use scorer::{keyword_score, KeywordMatch, KeywordScorer};
