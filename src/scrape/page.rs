use crate::article::NormalizedArticle;
use crate::fetch::{fetch_bytes, FetchError};
use crate::scrape::classify::is_listing;
use crate::scrape::extract::extract_article;
use crate::scrape::links::extract_article_links;
use crate::util::validate_url;
use futures::stream::{self, StreamExt};
use scraper::Html;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Default cap on articles scraped from one listing page.
pub const DEFAULT_MAX_ARTICLES: usize = 10;

/// Errors from scraping a single page.
#[derive(Debug, Error)]
pub enum ScrapeError {
    /// The URL is not an absolute URL; no request was made.
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    /// Transport failure, timeout, or non-success HTTP status.
    #[error("Failed to fetch page: {0}")]
    Fetch(#[from] FetchError),
}

/// Tuning for [`scrape_page`].
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Fan-out cap for listing pages, applied before any article is fetched.
    pub max_articles: usize,
    /// Article pages fetched at once during fan-out. Output order is always
    /// link-discovery order.
    pub concurrency: usize,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_articles: DEFAULT_MAX_ARTICLES,
            concurrency: 4,
        }
    }
}

/// Result of inspecting a fetched page.
enum PageKind {
    Listing(Vec<String>),
    Article(Box<NormalizedArticle>),
}

/// Scrapes a URL that may be either a listing page or a single article.
///
/// Listing pages fan out to at most `options.max_articles` discovered links.
/// A failure on any one link is logged and skipped. Only a failure to fetch
/// `url` itself is returned as an error.
pub async fn scrape_page(
    client: &reqwest::Client,
    url: &str,
    options: &ScrapeOptions,
) -> Result<Vec<NormalizedArticle>, ScrapeError> {
    let validated = validate_url(url).map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;
    tracing::info!(url = %validated, "Scraping page");

    let html = fetch_html(client, &validated, options.timeout).await?;

    // Html is not Send; keep it out of any await point.
    let links = match inspect_page(&validated, &html) {
        PageKind::Article(article) => {
            tracing::info!(url = %validated, title = %article.title, "Scraped single article");
            return Ok(vec![*article]);
        }
        PageKind::Listing(links) => links,
    };

    if links.is_empty() {
        tracing::warn!(url = %validated, "No article links found on listing page");
        return Ok(Vec::new());
    }

    let found = links.len();
    let links: Vec<String> = links.into_iter().take(options.max_articles).collect();
    tracing::info!(
        url = %validated,
        found = found,
        scraping = links.len(),
        "Detected listing page"
    );

    let total = links.len();
    let articles: Vec<NormalizedArticle> = stream::iter(links)
        .map(|link| async move {
            match scrape_article(client, &link, options.timeout).await {
                Ok(article) => Some(article),
                Err(e) => {
                    tracing::warn!(url = %link, error = %e, "Failed to scrape article, skipping");
                    None
                }
            }
        })
        .buffered(options.concurrency.max(1))
        .filter_map(std::future::ready)
        .collect()
        .await;

    tracing::info!(
        url = %validated,
        scraped = articles.len(),
        attempted = total,
        "Finished listing page"
    );
    Ok(articles)
}

/// Scrapes one URL as a single article, without listing detection.
pub async fn scrape_article(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<NormalizedArticle, ScrapeError> {
    let validated = validate_url(url).map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;
    let html = fetch_html(client, &validated, timeout).await?;

    let article = extract_article(&validated, &Html::parse_document(&html));
    tracing::debug!(url = %validated, title = %article.title, "Scraped article");
    Ok(article)
}

async fn fetch_html(
    client: &reqwest::Client,
    url: &Url,
    timeout: Duration,
) -> Result<String, ScrapeError> {
    let bytes = fetch_bytes(client, url.as_str(), timeout).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Link discovery runs once and feeds both the listing decision and the
/// fan-out list.
fn inspect_page(url: &Url, html: &str) -> PageKind {
    let document = Html::parse_document(html);
    let links = extract_article_links(url, &document);
    if is_listing(url, &links) {
        PageKind::Listing(links)
    } else {
        PageKind::Article(Box::new(extract_article(url, &document)))
    }
}
