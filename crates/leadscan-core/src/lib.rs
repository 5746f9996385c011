//! Shared domain types and configuration for the lead digest workspace.

pub mod app_config;
pub mod config;
pub mod item;
pub mod scan_config;

pub use app_config::{AppConfig, Environment};
pub use config::{
    load_app_config, load_app_config_from_env, MOLTBOOK_API_KEY_VAR, TWITTER_BEARER_TOKEN_VAR,
};
pub use item::{metric, Item, Metrics, ParseSourceError, Source};
pub use scan_config::{
    load_scan_config, FeedConfig, FilterConfig, GithubSourceConfig, MatchMode,
    MoltbookSourceConfig, MonitoredSource, RateLimitConfig, RedditSourceConfig, ScanConfig,
    SourcesConfig, TierRule, TwitterSourceConfig, YoutubeChannelConfig,
    MAX_RETENTION_DAYS,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read scan config {path}: {source}")]
    ScanFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse scan config: {0}")]
    ScanFileParse(#[from] serde_yaml::Error),

    #[error("invalid scan config: {0}")]
    Validation(String),
}
