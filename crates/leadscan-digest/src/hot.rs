//! Engagement-jump detection against the ledger.

use serde::Serialize;

use crate::ledger::LedgerEntry;

/// Growth factor at which an item counts as hot.
pub const DEFAULT_HOT_THRESHOLD: f64 = 1.5;

/// An item whose engagement grew by at least the threshold since last seen.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HotFlag {
    pub canonical_url: String,
    pub old_engagement: i64,
    pub new_engagement: i64,
    pub ratio: f64,
}

/// Flag `url` when `prior.last_engagement > 0` and
/// `new_engagement >= prior.last_engagement * threshold`.
///
/// Without a prior entry the item is new, never hot.
#[must_use]
pub fn detect_hot(
    url: &str,
    new_engagement: i64,
    prior: Option<&LedgerEntry>,
    threshold: f64,
) -> Option<HotFlag> {
    let old_engagement = prior?.last_engagement;
    if old_engagement <= 0 {
        return None;
    }

    #[allow(clippy::cast_precision_loss)]
    let (old, new) = (old_engagement as f64, new_engagement as f64);
    if new < old * threshold {
        return None;
    }

    Some(HotFlag {
        canonical_url: url.to_string(),
        old_engagement,
        new_engagement,
        ratio: new / old,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn prior(last_engagement: i64) -> LedgerEntry {
        let now = Utc::now();
        LedgerEntry {
            first_seen: now,
            last_engagement,
            last_seen: now,
        }
    }

    #[test]
    fn new_items_are_never_hot() {
        assert!(detect_hot("a", 1_000, None, DEFAULT_HOT_THRESHOLD).is_none());
    }

    #[test]
    fn zero_baseline_is_never_hot() {
        assert!(detect_hot("a", 50, Some(&prior(0)), DEFAULT_HOT_THRESHOLD).is_none());
    }

    #[test]
    fn threshold_is_inclusive() {
        let flag = detect_hot("a", 150, Some(&prior(100)), DEFAULT_HOT_THRESHOLD).unwrap();
        assert_eq!(flag.old_engagement, 100);
        assert_eq!(flag.new_engagement, 150);
        assert!((flag.ratio - 1.5).abs() < f64::EPSILON);
        assert!(detect_hot("a", 149, Some(&prior(100)), DEFAULT_HOT_THRESHOLD).is_none());
    }

    #[test]
    fn detection_is_monotonic_in_new_engagement() {
        for baseline in [1_i64, 2, 7, 10, 33, 100, 999] {
            let entry = prior(baseline);
            for new in 0..=(baseline * 3) {
                let flagged = detect_hot("a", new, Some(&entry), DEFAULT_HOT_THRESHOLD).is_some();
                #[allow(clippy::cast_precision_loss)]
                let expected = new as f64 >= baseline as f64 * 1.5;
                assert_eq!(flagged, expected, "baseline {baseline}, new {new}");
            }
        }
    }

    #[test]
    fn custom_threshold_is_honoured() {
        assert!(detect_hot("a", 190, Some(&prior(100)), 2.0).is_none());
        assert!(detect_hot("a", 200, Some(&prior(100)), 2.0).is_some());
    }
}
