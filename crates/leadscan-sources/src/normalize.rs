//! Normalization from raw platform records to [`leadscan_core::Item`].
//!
//! The normalizer is picked by the record's source tag. A record is only
//! rejected when no canonical URL can be derived for it; every other missing
//! field gets a neutral default (empty text, zero metric, fetch time).

use chrono::{DateTime, Utc};
use leadscan_core::{metric, Item, Metrics, Source};

use crate::canonical::canonical_url;
use crate::error::NormalizationError;
use crate::types::{FeedEntry, GithubRepo, MoltbookPost, RawRecord, RedditPost, TwitterRecord};

const MOLTBOOK_POST_BASE: &str = "https://www.moltbook.com/post";
const GITHUB_BASE: &str = "https://github.com";

/// Normalizes one raw record.
///
/// # Errors
///
/// Returns [`NormalizationError`] when the record carries no usable URL.
pub fn normalize_record(
    record: &RawRecord,
    fetched_at: DateTime<Utc>,
) -> Result<Item, NormalizationError> {
    match record {
        RawRecord::Reddit(post) => normalize_reddit(post, fetched_at),
        RawRecord::Twitter(record) => normalize_tweet(record, fetched_at),
        RawRecord::Feed { source, entry } => normalize_feed_entry(*source, entry, fetched_at),
        RawRecord::Moltbook(post) => normalize_moltbook(post, fetched_at),
        RawRecord::Github(repo) => normalize_github(repo, fetched_at),
    }
}

/// Normalizes a batch, splitting usable items from rejected records.
#[must_use]
pub fn normalize_batch(
    records: &[RawRecord],
    fetched_at: DateTime<Utc>,
) -> (Vec<Item>, Vec<NormalizationError>) {
    let mut items = Vec::with_capacity(records.len());
    let mut errors = Vec::new();
    for record in records {
        match normalize_record(record, fetched_at) {
            Ok(item) => items.push(item),
            Err(e) => errors.push(e),
        }
    }
    (items, errors)
}

fn require_url(
    platform: Source,
    id: &str,
    raw: Option<&str>,
) -> Result<String, NormalizationError> {
    let raw = raw.map(str::trim).filter(|s| !s.is_empty()).ok_or_else(|| {
        NormalizationError::new(platform, id, "missing url")
    })?;
    canonical_url(raw)
        .ok_or_else(|| NormalizationError::new(platform, id, format!("unusable url '{raw}'")))
}

/// Reddit marks moderated text with these placeholders.
fn live_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "[deleted]" && *s != "[removed]")
        .map(str::to_string)
}

fn metrics(pairs: &[(&str, Option<i64>)]) -> Metrics {
    pairs
        .iter()
        .filter_map(|(key, value)| value.map(|v| ((*key).to_string(), v)))
        .collect()
}

fn normalize_reddit(
    post: &RedditPost,
    fetched_at: DateTime<Utc>,
) -> Result<Item, NormalizationError> {
    let id = post.id.clone().unwrap_or_default();
    let canonical_url = require_url(Source::Reddit, &id, post.permalink.as_deref())?;

    #[allow(clippy::cast_possible_truncation)]
    let created_at = post
        .created_utc
        .and_then(|ts| DateTime::from_timestamp(ts as i64, 0))
        .unwrap_or(fetched_at);

    Ok(Item {
        id: if id.is_empty() { canonical_url.clone() } else { id },
        canonical_url,
        source: Source::Reddit,
        source_name: post.subreddit.clone().unwrap_or_default(),
        title: post.title.clone().unwrap_or_default().trim().to_string(),
        body: live_text(post.selftext.as_deref()).unwrap_or_default(),
        author: live_text(post.author.as_deref()),
        metrics: metrics(&[
            (metric::UPVOTES, post.score),
            (metric::COMMENTS, post.num_comments),
        ]),
        created_at,
        fetched_at,
    })
}

fn normalize_tweet(
    record: &TwitterRecord,
    fetched_at: DateTime<Utc>,
) -> Result<Item, NormalizationError> {
    let tweet = &record.tweet;
    if tweet.id.trim().is_empty() || record.username.trim().is_empty() {
        return Err(NormalizationError::new(
            Source::Twitter,
            &tweet.id,
            "missing tweet id or username",
        ));
    }
    let permalink = format!("https://twitter.com/{}/status/{}", record.username, tweet.id);
    let canonical_url = require_url(Source::Twitter, &tweet.id, Some(&permalink))?;
    let public = tweet.public_metrics.clone().unwrap_or_default();

    Ok(Item {
        id: tweet.id.clone(),
        canonical_url,
        source: Source::Twitter,
        source_name: record.username.clone(),
        title: tweet.text.trim().to_string(),
        body: String::new(),
        author: Some(record.username.clone()),
        metrics: Metrics::from([
            (metric::LIKES.to_string(), public.like_count),
            (metric::RETWEETS.to_string(), public.retweet_count),
            (metric::REPLIES.to_string(), public.reply_count),
        ]),
        created_at: tweet.created_at.unwrap_or(fetched_at),
        fetched_at,
    })
}

fn normalize_feed_entry(
    source: Source,
    entry: &FeedEntry,
    fetched_at: DateTime<Utc>,
) -> Result<Item, NormalizationError> {
    let id = entry.id.clone().unwrap_or_else(|| entry.link.clone());
    let canonical_url = require_url(source, &id, Some(&entry.link))?;

    Ok(Item {
        id: if id.is_empty() { canonical_url.clone() } else { id },
        canonical_url,
        source,
        source_name: entry.feed_name.clone(),
        title: entry.title.clone(),
        body: entry.summary.clone(),
        author: entry.author.clone(),
        metrics: metrics(&[(metric::VIEWS, entry.views)]),
        created_at: entry.published.unwrap_or(fetched_at),
        fetched_at,
    })
}

fn normalize_moltbook(
    post: &MoltbookPost,
    fetched_at: DateTime<Utc>,
) -> Result<Item, NormalizationError> {
    let id = post.id.clone().unwrap_or_default();
    // The post page is the stable identity; `url` may point at an external link.
    let raw_url = if id.trim().is_empty() {
        post.url.clone()
    } else {
        Some(format!("{MOLTBOOK_POST_BASE}/{}", id.trim()))
    };
    let canonical_url = require_url(Source::Moltbook, &id, raw_url.as_deref())?;

    Ok(Item {
        id: if id.is_empty() { canonical_url.clone() } else { id },
        canonical_url,
        source: Source::Moltbook,
        source_name: post.submolt.clone().unwrap_or_default(),
        title: post.title.clone().unwrap_or_default(),
        body: post.content.clone().unwrap_or_default(),
        author: post.author.clone(),
        metrics: metrics(&[
            (metric::UPVOTES, post.upvotes),
            (metric::COMMENTS, post.comment_count),
        ]),
        created_at: post.created_at.unwrap_or(fetched_at),
        fetched_at,
    })
}

fn normalize_github(
    repo: &GithubRepo,
    fetched_at: DateTime<Utc>,
) -> Result<Item, NormalizationError> {
    let id = repo.id.to_string();
    let raw_url = repo.html_url.clone().or_else(|| {
        (!repo.full_name.is_empty()).then(|| format!("{GITHUB_BASE}/{}", repo.full_name))
    });
    let canonical_url = require_url(Source::Github, &id, raw_url.as_deref())?;
    let owner = repo.owner.as_ref().map(|o| o.login.clone());

    Ok(Item {
        id,
        canonical_url,
        source: Source::Github,
        source_name: owner
            .clone()
            .or_else(|| repo.full_name.split('/').next().map(str::to_string))
            .unwrap_or_default(),
        title: repo.full_name.clone(),
        body: repo.description.clone().unwrap_or_default(),
        author: owner,
        metrics: metrics(&[
            (metric::STARS, repo.stargazers_count),
            (metric::FORKS, repo.forks_count),
        ]),
        created_at: repo.created_at.unwrap_or(fetched_at),
        fetched_at,
    })
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
