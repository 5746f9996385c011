//! Seen-item ledger: first-seen time and last-known engagement per
//! canonical URL, with a rolling retention window.
//!
//! The ledger itself is a plain in-memory map owned by one task. Persistence
//! is injected through [`LedgerStore`] so scans can run against a JSON file
//! or, in tests, against memory.

use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LedgerIoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub first_seen: DateTime<Utc>,
    #[serde(default)]
    pub last_engagement: i64,
    pub last_seen: DateTime<Utc>,
}

/// Summary used by `ledger stats`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerStats {
    pub entries: usize,
    pub oldest_first_seen: Option<DateTime<Utc>>,
    pub newest_first_seen: Option<DateTime<Utc>>,
}

/// Canonical URL to [`LedgerEntry`]. Serializes as a JSON object keyed by URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: BTreeMap<String, LedgerEntry>,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn lookup(&self, url: &str) -> Option<&LedgerEntry> {
        self.entries.get(url)
    }

    /// Record one observation. A new URL gets `first_seen = now`; an existing
    /// one keeps its `first_seen`. Engagement and `last_seen` are always
    /// overwritten.
    pub fn record(&mut self, url: &str, engagement: i64, now: DateTime<Utc>) {
        self.entries
            .entry(url.to_string())
            .and_modify(|entry| {
                entry.last_engagement = engagement;
                entry.last_seen = now;
            })
            .or_insert(LedgerEntry {
                first_seen: now,
                last_engagement: engagement,
                last_seen: now,
            });
    }

    /// Remove every entry whose `first_seen` is older than `now - retention`.
    /// Returns the number of entries removed. A window reaching past the
    /// earliest representable time removes nothing.
    pub fn prune(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let Some(cutoff) = now.checked_sub_signed(retention) else {
            return 0;
        };
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.first_seen >= cutoff);
        before - self.entries.len()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &LedgerEntry)> {
        self.entries.iter().map(|(url, entry)| (url.as_str(), entry))
    }

    #[must_use]
    pub fn stats(&self) -> LedgerStats {
        LedgerStats {
            entries: self.entries.len(),
            oldest_first_seen: self.entries.values().map(|e| e.first_seen).min(),
            newest_first_seen: self.entries.values().map(|e| e.first_seen).max(),
        }
    }
}

/// Load/save capability for a [`Ledger`].
pub trait LedgerStore: Send + Sync {
    /// # Errors
    ///
    /// Returns [`LedgerIoError`] when persisted state exists but cannot be
    /// read or parsed. A store with nothing persisted yet returns an empty
    /// ledger.
    fn load(&self) -> Result<Ledger, LedgerIoError>;

    /// Persist `ledger` durably before returning.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerIoError`] when the write fails.
    fn save(&self, ledger: &Ledger) -> Result<(), LedgerIoError>;

    /// Where the ledger lives, for logs.
    fn location(&self) -> String;
}

/// JSON file store. Writes go to a sibling temp file which is synced and
/// then renamed over the target.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl LedgerStore for JsonFileStore {
    fn load(&self) -> Result<Ledger, LedgerIoError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no ledger file yet, starting empty");
                return Ok(Ledger::new());
            }
            Err(source) => {
                return Err(LedgerIoError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };
        if raw.trim().is_empty() {
            return Ok(Ledger::new());
        }
        serde_json::from_str(&raw).map_err(|source| LedgerIoError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerIoError> {
        let json = serde_json::to_string_pretty(ledger)?;
        let write_err = |source| LedgerIoError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let temp = self.temp_path();
        let mut file = fs::File::create(&temp).map_err(write_err)?;
        file.write_all(json.as_bytes()).map_err(write_err)?;
        file.sync_all().map_err(write_err)?;
        drop(file);
        fs::rename(&temp, &self.path).map_err(write_err)?;
        Ok(())
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    ledger: Mutex<Ledger>,
    fail_loads: bool,
    fail_saves: bool,
}

impl MemoryStore {
    #[must_use]
    pub fn new(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            fail_loads: false,
            fail_saves: false,
        }
    }

    /// A store whose `load` always fails; saves still succeed.
    #[must_use]
    pub fn failing_loads() -> Self {
        Self {
            ledger: Mutex::new(Ledger::new()),
            fail_loads: true,
            fail_saves: false,
        }
    }

    /// A store whose `save` always fails, for exercising the not-persisted path.
    #[must_use]
    pub fn failing_saves(ledger: Ledger) -> Self {
        Self {
            ledger: Mutex::new(ledger),
            fail_loads: false,
            fail_saves: true,
        }
    }

    /// Copy of the last saved ledger.
    #[must_use]
    pub fn snapshot(&self) -> Ledger {
        self.ledger
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default()
    }
}

impl LedgerStore for MemoryStore {
    fn load(&self) -> Result<Ledger, LedgerIoError> {
        if self.fail_loads {
            return Err(LedgerIoError::Unavailable(
                "memory store configured to fail loads".to_string(),
            ));
        }
        self.ledger
            .lock()
            .map(|guard| guard.clone())
            .map_err(|_| LedgerIoError::Unavailable("memory store lock poisoned".to_string()))
    }

    fn save(&self, ledger: &Ledger) -> Result<(), LedgerIoError> {
        if self.fail_saves {
            return Err(LedgerIoError::Unavailable(
                "memory store configured to fail saves".to_string(),
            ));
        }
        let mut guard = self
            .ledger
            .lock()
            .map_err(|_| LedgerIoError::Unavailable("memory store lock poisoned".to_string()))?;
        *guard = ledger.clone();
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}

#[cfg(test)]
#[path = "ledger_test.rs"]
mod tests;
