use std::path::PathBuf;

use thiserror::Error;

/// Failure to load or save the persisted ledger.
///
/// A load failure degrades the scan to an empty ledger; a save failure is
/// reported on the digest as "not persisted". Neither aborts a scan.
#[derive(Debug, Error)]
pub enum LedgerIoError {
    #[error("failed to read ledger {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse ledger {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to write ledger {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize ledger: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("ledger store unavailable: {0}")]
    Unavailable(String),
}

/// Errors that abort a whole scan. Everything per-item or per-source is
/// isolated and reported instead.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("no keywords configured; scoring is meaningless without them")]
    NoKeywords,
}
