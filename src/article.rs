use serde::{Deserialize, Serialize};

/// Feed title used when a syndication document has none.
pub const UNKNOWN_FEED_TITLE: &str = "Unknown Feed";

/// The canonical article record produced by every ingestion path.
///
/// Feed entries and scraped pages both end up here, so the catalog API can
/// treat them identically. Serialization always emits every key; optional
/// fields become `null` rather than being omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedArticle {
    /// Headline, never empty.
    pub title: String,
    /// Absolute URL of the article; the natural identity key.
    pub original_url: String,
    /// Best-effort body text. May be empty.
    pub content: String,
    /// Short summary, empty string when absent.
    pub description: String,
    pub author: Option<String>,
    /// ISO-8601 when normalisation succeeded, otherwise the raw string.
    pub publication_date: Option<String>,
    /// Domain of origin, e.g. `example.com`.
    pub source: String,
    /// Title of the originating feed; the domain for scraped pages.
    pub feed_title: String,
    pub language: Option<String>,
}

/// What kind of document a configured URL points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FetchKind {
    /// RSS/Atom syndication document.
    Feed,
    /// HTML page (listing or single article).
    Page,
}
