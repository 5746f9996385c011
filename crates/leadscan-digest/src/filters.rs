//! Lead filters applied after scoring: service offers and engagement floors.

use std::collections::BTreeMap;

use leadscan_core::{FilterConfig, Item, Source};
use serde::Serialize;

/// Phrases that mark a post as someone selling a service rather than
/// looking for one.
const SERVICE_OFFER_PHRASES: &[&str] = &[
    "will do",
    "available for",
    "offering",
    "can help",
    "looking to work",
    "hire me",
    "freelancer available",
    "dm me",
    "reach out",
    "contact me",
    "for hire",
    "book a call",
    "free consultation",
    "get in touch",
    "i can build",
    "i specialize",
    "i offer",
];

const PRICE_TERMS: &[&str] = &["$", "usd", "price:", "pricing"];
const OFFER_VERBS: &[&str] = &["will", "can", "available", "offering"];

/// Whether `text` reads like a service advertisement.
///
/// True on any offer phrase, or on a price term together with an offer verb.
#[must_use]
pub fn is_service_offer(text: &str) -> bool {
    let lowered = text.to_lowercase();
    if SERVICE_OFFER_PHRASES.iter().any(|p| lowered.contains(p)) {
        return true;
    }
    PRICE_TERMS.iter().any(|p| lowered.contains(p))
        && OFFER_VERBS.iter().any(|v| lowered.contains(v))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    Keep,
    ServiceOffer,
    TooFewKeywords,
    LowEngagement,
}

#[derive(Debug, Clone, Default)]
pub struct LeadFilter {
    exclude_service_offers: bool,
    min_keyword_matches: usize,
    min_engagement: BTreeMap<Source, i64>,
}

impl LeadFilter {
    #[must_use]
    pub fn from_config(config: &FilterConfig) -> Self {
        Self {
            exclude_service_offers: config.exclude_service_offers,
            min_keyword_matches: config.min_keyword_matches,
            min_engagement: config.min_engagement.clone(),
        }
    }

    /// Decide whether a scored item belongs in the digest.
    #[must_use]
    pub fn check(&self, item: &Item, keyword_matches: usize, engagement: i64) -> Verdict {
        if self.exclude_service_offers && is_service_offer(&item.searchable_text()) {
            return Verdict::ServiceOffer;
        }
        if keyword_matches < self.min_keyword_matches {
            return Verdict::TooFewKeywords;
        }
        if let Some(floor) = self.min_engagement.get(&item.source) {
            if engagement < *floor {
                return Verdict::LowEngagement;
            }
        }
        Verdict::Keep
    }
}
