//! Platform adapters for the lead digest.
//!
//! Each platform has a thin HTTP client that returns raw records, and a
//! normalizer that turns those records into [`leadscan_core::Item`]s keyed by
//! a canonical URL. Fetchers share one capability, [`Fetcher`], so the scan
//! pipeline can fan them out without knowing which platform it is talking to.

pub mod canonical;
pub mod error;
pub mod feed;
pub mod fetcher;
pub mod github;
pub mod moltbook;
pub mod normalize;
pub mod rate_limit;
pub mod reddit;
pub mod registry;
pub mod twitter;
pub mod types;

mod http;

pub use canonical::canonical_url;
pub use error::{FetchError, NormalizationError};
pub use fetcher::{Fetcher, HttpSettings};
pub use normalize::{normalize_batch, normalize_record};
pub use rate_limit::RateLimiter;
pub use registry::{build_fetchers, disabled_sources};
pub use types::{FeedEntry, GithubRepo, MoltbookPost, RawRecord, RedditPost, Tweet, TwitterRecord};
