use crate::article::FetchKind;
use crate::scrape::links::extract_article_links;
use regex::RegexSet;
use scraper::Html;
use std::sync::LazyLock;
use url::Url;

/// Substrings that mark a URL as a syndication feed.
const FEED_INDICATORS: &[&str] = &[
    "/rss", "/feed", "/atom", ".rss", ".xml", "rss.xml", "feed.xml", "atom.xml",
];

/// A page with at least this many article links is treated as a listing.
pub const LISTING_LINK_THRESHOLD: usize = 3;

/// Index-like URL shapes: homepage, `/index`, section roots.
static LISTING_URL: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"/$",
        r"/index",
        r"/news/?$",
        r"/blog/?$",
        r"/articles/?$",
        r"/category/",
        r"/section/",
    ])
    .expect("static patterns are valid")
});

/// Decides whether a URL should go through the feed or page extractor.
///
/// Pure, case-insensitive substring test; no network access.
///
/// ```
/// use harvest::article::FetchKind;
/// use harvest::scrape::classify_fetch_kind;
///
/// assert_eq!(classify_fetch_kind("https://x.com/RSS"), FetchKind::Feed);
/// assert_eq!(classify_fetch_kind("https://x.com/article"), FetchKind::Page);
/// ```
pub fn classify_fetch_kind(url: &str) -> FetchKind {
    let lower = url.to_lowercase();
    if FEED_INDICATORS.iter().any(|ind| lower.contains(ind)) {
        FetchKind::Feed
    } else {
        FetchKind::Page
    }
}

/// Heuristic listing-page check.
///
/// True when the URL looks like an index page, or when the document links
/// to at least [`LISTING_LINK_THRESHOLD`] same-site articles. False
/// positives and negatives are expected.
pub fn is_listing_page(url: &Url, document: &Html) -> bool {
    if has_listing_url(url) {
        return true;
    }
    extract_article_links(url, document).len() >= LISTING_LINK_THRESHOLD
}

/// Listing check for a page whose article links were already discovered.
pub(crate) fn is_listing(url: &Url, article_links: &[String]) -> bool {
    has_listing_url(url) || article_links.len() >= LISTING_LINK_THRESHOLD
}

fn has_listing_url(url: &Url) -> bool {
    LISTING_URL.is_match(&url.as_str().to_lowercase())
}
