use crate::article::NormalizedArticle;
use crate::feed::parser::{parse_feed, ParseResult};
use crate::fetch::{fetch_bytes, FetchError};
use crate::util::validate_url;
use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;

/// Maximum number of feeds fetched at the same time by [`fetch_multiple_feeds`].
const MAX_CONCURRENT_FEEDS: usize = 10;

/// Feed-level failures. Per-entry problems never surface here.
#[derive(Debug, Error)]
pub enum FeedError {
    /// The feed URL is not an absolute URL; no request was made.
    #[error("Invalid feed URL: {0}")]
    InvalidUrl(String),
    /// The feed document could not be retrieved.
    #[error("Feed fetch failed: {0}")]
    Fetch(#[from] FetchError),
    /// The document was retrieved but is not a parseable RSS/Atom/JSON feed.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Fetches a single feed and normalizes its entries.
///
/// # Errors
///
/// - [`FeedError::InvalidUrl`] - `url` lacks a scheme or host
/// - [`FeedError::Fetch`] - transport failure, timeout, or non-2xx status
/// - [`FeedError::Parse`] - the body is not a syndication document
///
/// An empty feed is not an error and yields an empty `Vec`.
pub async fn fetch_feed(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<NormalizedArticle>, FeedError> {
    let validated = validate_url(url).map_err(|e| FeedError::InvalidUrl(e.to_string()))?;
    let url_str = validated.as_str();

    tracing::info!(feed = %url_str, "Fetching feed");
    let bytes = fetch_bytes(client, url_str, timeout).await?;

    let ParseResult {
        feed_title,
        articles,
        skipped,
    } = parse_feed(&bytes, url_str).map_err(|e| FeedError::Parse(e.to_string()))?;

    if skipped > 0 {
        tracing::warn!(
            feed = %url_str,
            skipped = skipped,
            "Entries without title or link skipped"
        );
    }
    if articles.is_empty() {
        tracing::warn!(feed = %url_str, title = %feed_title, "No usable entries in feed");
    } else {
        tracing::info!(
            feed = %url_str,
            title = %feed_title,
            count = articles.len(),
            "Fetched feed articles"
        );
    }

    Ok(articles)
}

/// Fetches several feeds concurrently, keyed by input URL.
///
/// A feed that fails for any reason maps to an empty `Vec`; it never affects
/// the other feeds.
pub async fn fetch_multiple_feeds(
    client: &reqwest::Client,
    urls: &[String],
    timeout: Duration,
) -> HashMap<String, Vec<NormalizedArticle>> {
    let results: HashMap<String, Vec<NormalizedArticle>> = stream::iter(urls.iter().cloned())
        .map(|url| async move {
            let articles = match fetch_feed(client, &url, timeout).await {
                Ok(articles) => articles,
                Err(e) => {
                    tracing::error!(feed = %url, error = %e, "Skipping feed due to error");
                    Vec::new()
                }
            };
            (url, articles)
        })
        .buffer_unordered(MAX_CONCURRENT_FEEDS)
        .collect()
        .await;

    let total: usize = results.values().map(Vec::len).sum();
    tracing::info!(
        feeds = urls.len(),
        articles = total,
        "Fetched articles from feeds"
    );

    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    const VALID_RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel>
    <title>Test Feed</title>
    <item><guid>1</guid><title>Test</title><link>https://example.com/1</link></item>
    <item><guid>2</guid><title>No link</title></item>
</channel></rss>"#;

    async fn mount(server: &MockServer, route: &str, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_fetch_feed_success() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            "/feed",
            ResponseTemplate::new(200)
                .set_body_string(VALID_RSS)
                .insert_header("Content-Type", "application/xml"),
        )
        .await;

        let client = reqwest::Client::new();
        let url = format!("{}/feed", mock_server.uri());
        let articles = fetch_feed(&client, &url, TIMEOUT).await.unwrap();

        assert_eq!(articles.len(), 1);
        assert_eq!(articles[0].title, "Test");
        assert_eq!(articles[0].feed_title, "Test Feed");
        assert_eq!(articles[0].source, crate::util::domain_from_str(&url));
    }

    #[tokio::test]
    async fn test_fetch_feed_invalid_url() {
        let client = reqwest::Client::new();
        let result = fetch_feed(&client, "not a url", TIMEOUT).await;
        assert!(matches!(result, Err(FeedError::InvalidUrl(_))));
    }

    #[tokio::test]
    async fn test_fetch_feed_404_error() {
        let mock_server = MockServer::start().await;
        mount(&mock_server, "/feed", ResponseTemplate::new(404)).await;

        let client = reqwest::Client::new();
        let result = fetch_feed(&client, &format!("{}/feed", mock_server.uri()), TIMEOUT).await;
        match result {
            Err(FeedError::Fetch(FetchError::HttpStatus(404))) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_malformed_feed_parse_error() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            "/feed",
            ResponseTemplate::new(200).set_body_string("<not valid xml"),
        )
        .await;

        let client = reqwest::Client::new();
        let result = fetch_feed(&client, &format!("{}/feed", mock_server.uri()), TIMEOUT).await;
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }

    #[tokio::test]
    async fn test_empty_feed_success() {
        let empty_rss = r#"<?xml version="1.0"?>
<rss version="2.0"><channel></channel></rss>"#;

        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            "/feed",
            ResponseTemplate::new(200).set_body_string(empty_rss),
        )
        .await;

        let client = reqwest::Client::new();
        let articles = fetch_feed(&client, &format!("{}/feed", mock_server.uri()), TIMEOUT)
            .await
            .unwrap();
        assert!(articles.is_empty());
    }

    #[tokio::test]
    async fn test_multiple_feeds_isolate_failures() {
        let mock_server = MockServer::start().await;
        mount(
            &mock_server,
            "/good.xml",
            ResponseTemplate::new(200).set_body_string(VALID_RSS),
        )
        .await;
        mount(&mock_server, "/bad.xml", ResponseTemplate::new(500)).await;

        let good = format!("{}/good.xml", mock_server.uri());
        let bad = format!("{}/bad.xml", mock_server.uri());
        let urls = vec![good.clone(), bad.clone(), "not a url".to_string()];

        let client = reqwest::Client::new();
        let results = fetch_multiple_feeds(&client, &urls, TIMEOUT).await;

        assert_eq!(results.len(), 3);
        assert_eq!(results[&good].len(), 1);
        assert!(results[&bad].is_empty());
        assert!(results["not a url"].is_empty());
    }
}
