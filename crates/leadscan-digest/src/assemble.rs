//! Digest assembly: group, sort, truncate, and cross-reference the hot and
//! discovery subgroups.
//!
//! Items live once in an arena (`Digest::entries`). Groups hold indices into
//! it, and each entry carries flags for every group it belongs to, so an item
//! that is both in its source group and hot is still one item.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use leadscan_core::{Item, ScanConfig, Source};
use serde::Serialize;

use crate::hot::HotFlag;

/// One item with everything computed about it during a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredItem {
    pub item: Item,
    pub keyword_matches: usize,
    pub matched_keywords: Vec<String>,
    /// Static 0-100 relevance of `item.source_name`.
    pub source_score: u8,
    pub engagement: i64,
    pub hot: Option<HotFlag>,
    /// No ledger entry existed before this scan.
    pub is_new: bool,
    /// Outside the monitored allow-list.
    pub discovery: bool,
}

impl ScoredItem {
    #[must_use]
    pub fn url(&self) -> &str {
        &self.item.canonical_url
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Membership {
    /// Shown in its source group (survived truncation).
    pub primary: bool,
    pub hot: bool,
    pub discovery: bool,
}

impl Membership {
    fn any(self) -> bool {
        self.primary || self.hot || self.discovery
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestEntry {
    #[serde(flatten)]
    pub scored: ScoredItem,
    pub membership: Membership,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceGroup {
    pub source: Source,
    /// Distinct items seen for this source before truncation.
    pub total: usize,
    /// Arena indices, best first.
    pub items: Vec<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Digest {
    pub generated_at: DateTime<Utc>,
    pub entries: Vec<DigestEntry>,
    /// Source groups in [`Source`] order; sources with no items are omitted.
    pub groups: Vec<SourceGroup>,
    pub discoveries: Vec<usize>,
    /// Hot items across all sources, highest ratio first.
    pub hot: Vec<usize>,
}

impl Digest {
    #[must_use]
    pub fn group(&self, source: Source) -> Option<&SourceGroup> {
        self.groups.iter().find(|g| g.source == source)
    }

    /// Items of `source`'s group in display order.
    pub fn group_items(&self, source: Source) -> impl Iterator<Item = &ScoredItem> {
        self.group(source)
            .map(|g| g.items.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&i| &self.entries[i].scored)
    }

    pub fn hot_items(&self) -> impl Iterator<Item = &ScoredItem> {
        self.hot.iter().map(|&i| &self.entries[i].scored)
    }

    pub fn discovery_items(&self) -> impl Iterator<Item = &ScoredItem> {
        self.discoveries.iter().map(|&i| &self.entries[i].scored)
    }

    /// Items shown in source groups, each counted once.
    #[must_use]
    pub fn shown_count(&self) -> usize {
        self.entries.iter().filter(|e| e.membership.primary).count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Composite order inside a group: hot first, then more keyword matches,
/// then more engagement. Ties fall back to URL so output is deterministic.
fn compare(a: &ScoredItem, b: &ScoredItem) -> Ordering {
    b.hot
        .is_some()
        .cmp(&a.hot.is_some())
        .then_with(|| b.keyword_matches.cmp(&a.keyword_matches))
        .then_with(|| b.engagement.cmp(&a.engagement))
        .then_with(|| a.url().cmp(b.url()))
}

fn hot_ratio(item: &ScoredItem) -> f64 {
    item.hot.as_ref().map_or(0.0, |h| h.ratio)
}

/// Collapse items sharing a canonical URL; the later one replaces the
/// earlier one in place.
fn dedupe_by_url(items: Vec<ScoredItem>) -> Vec<ScoredItem> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut unique: Vec<ScoredItem> = Vec::with_capacity(items.len());
    for item in items {
        match positions.get(item.url()) {
            Some(&i) => unique[i] = item,
            None => {
                positions.insert(item.url().to_string(), unique.len());
                unique.push(item);
            }
        }
    }
    unique
}

#[derive(Debug, Clone, Copy)]
pub struct DigestAssembler {
    per_source_limit: usize,
}

impl DigestAssembler {
    #[must_use]
    pub fn new(per_source_limit: usize) -> Self {
        Self {
            per_source_limit: per_source_limit.max(1),
        }
    }

    #[must_use]
    pub fn from_config(config: &ScanConfig) -> Self {
        Self::new(config.per_source_limit)
    }

    #[must_use]
    pub fn assemble(&self, items: Vec<ScoredItem>, generated_at: DateTime<Utc>) -> Digest {
        let items = dedupe_by_url(items);

        let mut order: Vec<usize> = (0..items.len()).collect();
        order.sort_by(|&a, &b| compare(&items[a], &items[b]));

        let mut membership = vec![Membership::default(); items.len()];

        let mut by_source: BTreeMap<Source, Vec<usize>> = BTreeMap::new();
        for &i in &order {
            by_source.entry(items[i].item.source).or_default().push(i);
        }
        let mut groups: Vec<(Source, usize, Vec<usize>)> = Vec::with_capacity(by_source.len());
        for (source, mut indices) in by_source {
            let total = indices.len();
            indices.truncate(self.per_source_limit);
            for &i in &indices {
                membership[i].primary = true;
            }
            groups.push((source, total, indices));
        }

        let discoveries: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&i| items[i].discovery)
            .collect();
        for &i in &discoveries {
            membership[i].discovery = true;
        }

        let mut hot: Vec<usize> = order
            .iter()
            .copied()
            .filter(|&i| items[i].hot.is_some())
            .collect();
        hot.sort_by(|&a, &b| {
            hot_ratio(&items[b])
                .total_cmp(&hot_ratio(&items[a]))
                .then_with(|| items[a].url().cmp(items[b].url()))
        });
        for &i in &hot {
            membership[i].hot = true;
        }

        // Compact into the arena in composite order, dropping items that
        // ended up in no group.
        let mut slots: Vec<Option<ScoredItem>> = items.into_iter().map(Some).collect();
        let mut remap: Vec<Option<usize>> = vec![None; slots.len()];
        let mut entries = Vec::new();
        for &i in &order {
            if !membership[i].any() {
                continue;
            }
            if let Some(scored) = slots[i].take() {
                remap[i] = Some(entries.len());
                entries.push(DigestEntry {
                    scored,
                    membership: membership[i],
                });
            }
        }
        let relink = |indices: Vec<usize>| -> Vec<usize> {
            indices.into_iter().filter_map(|i| remap[i]).collect()
        };

        Digest {
            generated_at,
            entries,
            groups: groups
                .into_iter()
                .map(|(source, total, indices)| SourceGroup {
                    source,
                    total,
                    items: relink(indices),
                })
                .collect(),
            discoveries: relink(discoveries),
            hot: relink(hot),
        }
    }
}

impl Default for DigestAssembler {
    fn default() -> Self {
        Self::new(20)
    }
}

#[cfg(test)]
#[path = "assemble_test.rs"]
mod tests;
