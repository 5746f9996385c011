//! RSS 2.0 and Atom feed client, used for news feeds, health feeds and
//! `YouTube` channel feeds.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use leadscan_core::{FeedConfig, Source, YoutubeChannelConfig};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::FetchError;
use crate::fetcher::{merge_partial, Fetcher, HttpSettings};
use crate::http::{fetch_text, join_url};
use crate::rate_limit::RateLimiter;
use crate::types::{FeedEntry, RawRecord};

const YOUTUBE_BASE_URL: &str = "https://www.youtube.com";
const MAX_ENTRIES_PER_FEED: usize = 20;

/// A named feed URL.
#[derive(Debug, Clone)]
pub struct FeedTarget {
    pub name: String,
    pub url: String,
}

/// Fetches a list of feeds and tags every entry with one source.
pub struct FeedClient {
    client: reqwest::Client,
    settings: HttpSettings,
    limiter: RateLimiter,
    source: Source,
    targets: Vec<FeedTarget>,
}

impl FeedClient {
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] if the HTTP client cannot be built.
    pub fn new(
        source: Source,
        targets: Vec<FeedTarget>,
        settings: HttpSettings,
        limiter: RateLimiter,
    ) -> Result<Self, FetchError> {
        let client = settings.build_client()?;
        Ok(Self {
            client,
            settings,
            limiter,
            source,
            targets,
        })
    }

    /// Feeds from the `rss` section that carry the given tag (`rss` when untagged).
    #[must_use]
    pub fn targets_for(feeds: &[FeedConfig], source: Source) -> Vec<FeedTarget> {
        feeds
            .iter()
            .filter(|feed| feed.source.unwrap_or(Source::Rss) == source)
            .map(|feed| FeedTarget {
                name: feed.name.clone(),
                url: feed.url.clone(),
            })
            .collect()
    }

    /// `YouTube` channel feed URLs for the configured channels.
    #[must_use]
    pub fn youtube_targets(channels: &[YoutubeChannelConfig], base_url: &str) -> Vec<FeedTarget> {
        let base = if base_url.is_empty() {
            YOUTUBE_BASE_URL
        } else {
            base_url
        };
        channels
            .iter()
            .map(|channel| {
                let encoded = utf8_percent_encode(&channel.channel_id, NON_ALPHANUMERIC);
                FeedTarget {
                    name: channel.name.clone(),
                    url: join_url(base, &format!("feeds/videos.xml?channel_id={encoded}")),
                }
            })
            .collect()
    }

    /// Fetch and parse one feed.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Http`] for network failures and
    /// [`FetchError::Xml`] for malformed feed content.
    pub async fn fetch_feed(&self, target: &FeedTarget) -> Result<Vec<FeedEntry>, FetchError> {
        let body = fetch_text(&self.settings, &self.limiter, &target.url, || {
            self.client.get(&target.url)
        })
        .await?;
        parse_feed(&body, &target.name, MAX_ENTRIES_PER_FEED)
    }
}

#[async_trait]
impl Fetcher for FeedClient {
    fn source(&self) -> Source {
        self.source
    }

    async fn fetch(&self) -> Result<Vec<RawRecord>, FetchError> {
        let mut results = Vec::with_capacity(self.targets.len());
        for target in &self.targets {
            let source = self.source;
            let result = self.fetch_feed(target).await.map(|entries| {
                entries
                    .into_iter()
                    .map(|entry| RawRecord::Feed { source, entry })
                    .collect()
            });
            results.push((target.name.clone(), result));
        }
        merge_partial(self.source, results)
    }
}

/// Which text field the parser is currently inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    None,
    Id,
    VideoId,
    Title,
    Link,
    Summary,
    Author,
    Published,
}

fn field_for(tag: &str, in_author: bool) -> Field {
    match tag {
        "title" | "media:title" => Field::Title,
        "link" => Field::Link,
        "guid" | "id" => Field::Id,
        "yt:videoId" => Field::VideoId,
        "description" | "summary" | "content" | "media:description" | "content:encoded" => {
            Field::Summary
        }
        "author" | "dc:creator" => Field::Author,
        "name" if in_author => Field::Author,
        "pubDate" | "published" | "updated" | "dc:date" => Field::Published,
        _ => Field::None,
    }
}

#[derive(Default)]
struct EntryBuilder {
    id: String,
    title: String,
    link: String,
    summary: String,
    author: String,
    published: String,
    views: Option<i64>,
}

impl EntryBuilder {
    fn push(&mut self, field: Field, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        match field {
            // First value wins, except that a `YouTube` video id replaces the
            // Atom `id`. `media:title` repeats the entry title.
            Field::VideoId => self.id = text.to_string(),
            Field::Id if self.id.is_empty() => self.id = text.to_string(),
            Field::Title if self.title.is_empty() => self.title = text.to_string(),
            Field::Link if self.link.is_empty() => self.link = text.to_string(),
            Field::Summary if self.summary.is_empty() => self.summary = strip_html(text),
            Field::Author if self.author.is_empty() => self.author = text.to_string(),
            Field::Published if self.published.is_empty() => self.published = text.to_string(),
            _ => {}
        }
    }

    fn take_link_attr(&mut self, e: &BytesStart<'_>) {
        let mut href = None;
        let mut rel = None;
        for attr in e.attributes().flatten() {
            let value = String::from_utf8_lossy(attr.value.as_ref()).into_owned();
            match attr.key.as_ref() {
                b"href" => href = Some(value),
                b"rel" => rel = Some(value),
                _ => {}
            }
        }
        let is_alternate = rel.as_deref().is_none_or(|r| r == "alternate");
        if let Some(href) = href {
            if is_alternate && self.link.is_empty() {
                self.link = href;
            }
        }
    }

    fn take_statistics_attr(&mut self, e: &BytesStart<'_>) {
        for attr in e.attributes().flatten() {
            if attr.key.as_ref() == b"views" {
                self.views = String::from_utf8_lossy(attr.value.as_ref())
                    .trim()
                    .parse::<i64>()
                    .ok();
            }
        }
    }

    fn finish(self, feed_name: &str) -> FeedEntry {
        let non_empty = |s: String| if s.is_empty() { None } else { Some(s) };
        FeedEntry {
            feed_name: feed_name.to_string(),
            id: non_empty(self.id),
            title: self.title,
            link: self.link,
            summary: self.summary,
            author: non_empty(self.author),
            published: parse_feed_date(&self.published),
            views: self.views,
        }
    }
}

fn tag_name(e: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(e.name().as_ref()).into_owned()
}

/// Parse an RSS 2.0 or Atom document into [`FeedEntry`]s.
///
/// Reads `<item>` and `<entry>` elements. HTML in descriptions is stripped.
/// Entries are kept even without a link; the normalizer decides whether
/// they are usable. Stops after `max_entries` entries.
///
/// # Errors
///
/// Returns [`FetchError::Xml`] if the document is not well-formed XML.
pub fn parse_feed(
    xml: &str,
    feed_name: &str,
    max_entries: usize,
) -> Result<Vec<FeedEntry>, FetchError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<EntryBuilder> = None;
    let mut field = Field::None;
    let mut in_author = false;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = tag_name(&e);
                if name == "item" || name == "entry" {
                    current = Some(EntryBuilder::default());
                    field = Field::None;
                    in_author = false;
                } else if let Some(entry) = current.as_mut() {
                    if name == "link" {
                        entry.take_link_attr(&e);
                    } else if name == "media:statistics" {
                        entry.take_statistics_attr(&e);
                    }
                    field = field_for(&name, in_author);
                    if name == "author" {
                        in_author = true;
                    }
                }
            }
            Event::Empty(e) => {
                if let Some(entry) = current.as_mut() {
                    match tag_name(&e).as_str() {
                        "link" => entry.take_link_attr(&e),
                        "media:statistics" => entry.take_statistics_attr(&e),
                        _ => {}
                    }
                }
            }
            Event::Text(e) => {
                if let Some(entry) = current.as_mut() {
                    let text = e.unescape().unwrap_or_default();
                    entry.push(field, &text);
                }
            }
            Event::CData(e) => {
                if let Some(entry) = current.as_mut() {
                    let text = String::from_utf8_lossy(e.as_ref()).into_owned();
                    entry.push(field, &text);
                }
            }
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                match name.as_str() {
                    "item" | "entry" => {
                        if let Some(entry) = current.take() {
                            entries.push(entry.finish(feed_name));
                            if entries.len() >= max_entries {
                                break;
                            }
                        }
                    }
                    "author" => in_author = false,
                    _ => {}
                }
                field = Field::None;
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(entries)
}

/// Parse RFC 2822 (RSS) or RFC 3339 (Atom) timestamps.
fn parse_feed_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Strip HTML tags from a string and normalize whitespace.
pub(crate) fn strip_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut in_tag = false;
    for ch in html.chars() {
        match ch {
            '<' => in_tag = true,
            '>' => {
                in_tag = false;
                out.push(' ');
            }
            _ if !in_tag => out.push(ch),
            _ => {}
        }
    }
    out.split_whitespace().collect::<Vec<_>>().join(" ")
}
