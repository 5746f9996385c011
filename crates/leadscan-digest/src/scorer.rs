//! Keyword hit counting.
//!
//! Matching is case-insensitive substring containment over
//! `title + " " + body`, not word-boundary matching: `manual` matches inside
//! `manually`. Each distinct keyword counts at most once.

use leadscan_core::Item;
use serde::Serialize;

/// Result of scoring one text against the keyword set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct KeywordMatch {
    pub count: usize,
    /// Matched keywords in configuration order, as configured.
    pub matched: Vec<String>,
}

#[derive(Debug, Clone)]
struct Keyword {
    display: String,
    needle: String,
}

/// A prepared keyword set.
///
/// Keywords are trimmed and lowercased once; blanks and case-insensitive
/// duplicates are dropped.
#[derive(Debug, Clone, Default)]
pub struct KeywordScorer {
    keywords: Vec<Keyword>,
}

impl KeywordScorer {
    #[must_use]
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut prepared: Vec<Keyword> = Vec::new();
        for keyword in keywords {
            let display = keyword.as_ref().trim();
            if display.is_empty() {
                continue;
            }
            let needle = display.to_lowercase();
            if prepared.iter().any(|k| k.needle == needle) {
                continue;
            }
            prepared.push(Keyword {
                display: display.to_string(),
                needle,
            });
        }
        Self { keywords: prepared }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    #[must_use]
    pub fn score_text(&self, text: &str) -> KeywordMatch {
        if text.trim().is_empty() {
            return KeywordMatch::default();
        }
        let haystack = text.to_lowercase();
        let matched: Vec<String> = self
            .keywords
            .iter()
            .filter(|k| haystack.contains(&k.needle))
            .map(|k| k.display.clone())
            .collect();
        KeywordMatch {
            count: matched.len(),
            matched,
        }
    }

    #[must_use]
    pub fn score(&self, item: &Item) -> KeywordMatch {
        self.score_text(&item.searchable_text())
    }
}

/// Count of distinct `keywords` found in `text`.
#[must_use]
pub fn keyword_score<S: AsRef<str>>(text: &str, keywords: &[S]) -> usize {
    KeywordScorer::new(keywords).score_text(text).count
}
