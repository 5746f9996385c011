//! Canonical URL derivation.
//!
//! The canonical URL is the dedup key across scans, so two fetches of the same
//! content must produce byte-identical strings even when the platform hands
//! back different hosts, tracking parameters or trailing slashes.

use reqwest::Url;

const REDDIT_ORIGIN: &str = "https://www.reddit.com";

/// Host prefixes that point at the same content as the bare host.
const HOST_ALIASES: &[&str] = &["www.", "old.", "m.", "mobile."];

/// Query parameters that only carry tracking state.
const TRACKING_PARAMS: &[&str] = &["ref", "ref_src", "share", "si", "feature", "s"];

/// Derive the canonical form of `raw`.
///
/// Returns `None` when `raw` is empty, not an absolute `http(s)` URL, or has
/// no host. Relative paths starting with `/r/` are treated as Reddit
/// permalinks.
#[must_use]
pub fn canonical_url(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let mut url = if trimmed.starts_with("/r/") || trimmed.starts_with("/user/") {
        Url::parse(REDDIT_ORIGIN).ok()?.join(trimmed).ok()?
    } else {
        Url::parse(trimmed).ok()?
    };

    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_scheme("https").ok()?;

    let host = url.host_str()?.to_ascii_lowercase();
    let host = HOST_ALIASES
        .iter()
        .find_map(|prefix| host.strip_prefix(prefix))
        .map_or(host.clone(), str::to_string);
    let host = if host == "x.com" {
        "twitter.com".to_string()
    } else {
        host
    };
    url.set_host(Some(&host)).ok()?;
    let _ = url.set_port(None);

    url.set_fragment(None);

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !is_tracking_param(key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if kept.is_empty() {
        url.set_query(None);
    } else {
        url.query_pairs_mut().clear().extend_pairs(kept);
    }

    let path = url.path().to_string();
    if path.len() > 1 && path.ends_with('/') {
        url.set_path(path.trim_end_matches('/'));
    }

    Some(url.to_string())
}

fn is_tracking_param(key: &str) -> bool {
    key.starts_with("utm_") || TRACKING_PARAMS.contains(&key)
}
