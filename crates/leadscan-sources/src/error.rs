use leadscan_core::Source;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("XML parse error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("rate limited by {url} (retry after {retry_after_secs}s)")]
    RateLimited { url: String, retry_after_secs: u64 },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("{platform} API error: {message}")]
    Api { platform: Source, message: String },
}

/// A raw record that cannot be turned into an `Item` because no canonical
/// URL can be derived for it. The record is dropped and counted.
#[derive(Debug, Clone, Error)]
#[error("cannot normalize {platform} record '{id}': {reason}")]
pub struct NormalizationError {
    pub platform: Source,
    pub id: String,
    pub reason: String,
}

impl NormalizationError {
    pub(crate) fn new(platform: Source, id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            platform,
            id: id.into(),
            reason: reason.into(),
        }
    }
}
