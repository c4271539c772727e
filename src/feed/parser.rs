use crate::article::{NormalizedArticle, UNKNOWN_FEED_TITLE};
use crate::feed::raw_scan::{scan_raw, RawEntryDates, RawFeedScan};
use crate::util::{domain_from_str, non_empty, ISO_FORMAT};
use chrono::{DateTime, Utc};
use feed_rs::model::{Entry, Feed, Link};
use feed_rs::parser::{self, ParseFeedError};
use thiserror::Error;

/// Why a single entry was dropped. Never propagated past the parser.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("entry missing required field: title")]
    MissingTitle,
    #[error("entry missing required field: link")]
    MissingLink,
}

/// Output of [`parse_feed`]: normalized entries plus how many were skipped.
#[derive(Debug, Clone)]
pub struct ParseResult {
    pub feed_title: String,
    pub articles: Vec<NormalizedArticle>,
    pub skipped: usize,
}

/// Feed-level values copied into every entry.
struct FeedContext<'a> {
    title: String,
    source: String,
    language: Option<&'a str>,
}

type EntryLookup = fn(&Entry) -> Option<String>;

/// Body lookups, highest priority first. A present-but-empty content block
/// still wins over a richer summary.
const CONTENT_CHAIN: &[EntryLookup] = &[content_body, summary_text];

const AUTHOR_CHAIN: &[EntryLookup] = &[first_author];

/// Parses a syndication document into normalized articles.
///
/// `feed_url` supplies the `source` domain. Entries missing a title or link
/// are skipped and counted; only a document that cannot be parsed at all is
/// an error. An empty feed is `Ok` with no articles.
pub fn parse_feed(bytes: &[u8], feed_url: &str) -> Result<ParseResult, ParseFeedError> {
    let feed = parser::parse(bytes)?;

    let RawFeedScan {
        language: raw_language,
        entries: raw_entries,
    } = scan_raw(bytes);
    let raw_dates = if raw_entries.len() == feed.entries.len() {
        raw_entries
    } else {
        if !raw_entries.is_empty() {
            tracing::debug!(
                feed = %feed_url,
                parsed = feed.entries.len(),
                scanned = raw_entries.len(),
                "Raw date scan disagrees with parser, ignoring raw dates"
            );
        }
        Vec::new()
    };

    let ctx = FeedContext {
        title: feed_title(&feed),
        source: domain_from_str(feed_url),
        // feed-rs lowercases the language tag; prefer the text as written
        language: raw_language.as_deref().or(feed.language.as_deref()),
    };

    let mut articles = Vec::with_capacity(feed.entries.len());
    let mut skipped = 0;

    for (idx, entry) in feed.entries.iter().enumerate() {
        match normalize_entry(entry, raw_dates.get(idx), &ctx) {
            Ok(article) => articles.push(article),
            Err(e) => {
                skipped += 1;
                tracing::warn!(feed = %feed_url, entry = idx, error = %e, "Skipping feed entry");
            }
        }
    }

    Ok(ParseResult {
        feed_title: ctx.title,
        articles,
        skipped,
    })
}

fn normalize_entry(
    entry: &Entry,
    raw: Option<&RawEntryDates>,
    ctx: &FeedContext<'_>,
) -> Result<NormalizedArticle, EntryError> {
    let title = entry
        .title
        .as_ref()
        .and_then(|t| non_empty(&t.content))
        .ok_or(EntryError::MissingTitle)?;

    let original_url = entry_link(&entry.links)
        .and_then(|l| non_empty(&l.href))
        .ok_or(EntryError::MissingLink)?;

    let content = CONTENT_CHAIN
        .iter()
        .find_map(|lookup| lookup(entry))
        .unwrap_or_default();

    let description = summary_text(entry).unwrap_or_default();

    Ok(NormalizedArticle {
        title,
        original_url,
        content,
        description,
        author: AUTHOR_CHAIN.iter().find_map(|lookup| lookup(entry)),
        publication_date: entry_date(entry, raw),
        source: ctx.source.clone(),
        feed_title: ctx.title.clone(),
        language: ctx.language.and_then(non_empty),
    })
}

fn feed_title(feed: &Feed) -> String {
    feed.title
        .as_ref()
        .and_then(|t| non_empty(&t.content))
        .unwrap_or_else(|| UNKNOWN_FEED_TITLE.to_owned())
}

/// Prefers the entry's alternate link over enclosures and related links.
fn entry_link(links: &[Link]) -> Option<&Link> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
}

fn content_body(entry: &Entry) -> Option<String> {
    entry
        .content
        .as_ref()
        .and_then(|c| c.body.as_deref())
        .map(|body| body.trim().to_owned())
}

fn summary_text(entry: &Entry) -> Option<String> {
    entry.summary.as_ref().map(|s| s.content.trim().to_owned())
}

/// `feed-rs` folds `<author>`, Atom `<author><name>` and `dc:creator` into
/// `authors`, in document order.
fn first_author(entry: &Entry) -> Option<String> {
    entry.authors.iter().find_map(|p| non_empty(&p.name))
}

/// Parsed published, parsed updated, raw published, raw updated.
fn entry_date(entry: &Entry, raw: Option<&RawEntryDates>) -> Option<String> {
    entry
        .published
        .map(format_timestamp)
        .or_else(|| entry.updated.map(format_timestamp))
        .or_else(|| raw.and_then(|r| r.published.clone()))
        .or_else(|| raw.and_then(|r| r.updated.clone()))
}

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.naive_utc().format(ISO_FORMAT).to_string()
}
