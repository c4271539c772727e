//! One ingestion run: register every configured URL with the catalog,
//! harvest its articles, and submit them.

use crate::api::{CatalogClient, FeedType, SourceType, TaggedArticle};
use crate::article::{FetchKind, NormalizedArticle};
use crate::feed::fetch_feed;
use crate::scrape::{classify_fetch_kind, scrape_page, ScrapeOptions};
use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::collections::BTreeMap;

/// URLs harvested at the same time during a run.
const MAX_CONCURRENT_URLS: usize = 4;

/// Failures logged individually in the run summary log.
const MAX_LOGGED_FAILURES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// Outcome of [`IngestionWorker::run`], printed as JSON by the binary.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub status: RunStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_seconds: f64,
    pub feeds_created: usize,
    pub urls_processed: usize,
    /// Articles harvested per URL.
    pub feed_stats: BTreeMap<String, usize>,
    pub articles_fetched: usize,
    pub articles_posted: usize,
    pub articles_failed: usize,
}

impl RunSummary {
    fn new(start_time: DateTime<Utc>, urls_processed: usize) -> Self {
        Self {
            status: RunStatus::Success,
            error: None,
            start_time,
            end_time: start_time,
            duration_seconds: 0.0,
            feeds_created: 0,
            urls_processed,
            feed_stats: BTreeMap::new(),
            articles_fetched: 0,
            articles_posted: 0,
            articles_failed: 0,
        }
    }

    fn failed(mut self, message: &str) -> Self {
        tracing::error!(error = %message, "Ingestion run aborted");
        self.status = RunStatus::Error;
        self.error = Some(message.to_string());
        self.finish()
    }

    fn finish(mut self) -> Self {
        self.end_time = Utc::now();
        let millis = (self.end_time - self.start_time).num_milliseconds().max(0);
        self.duration_seconds = (millis as f64 / 10.0).round() / 100.0;
        self
    }

    pub fn is_success(&self) -> bool {
        self.status == RunStatus::Success
    }
}

/// A URL the catalog has accepted as a feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisteredFeed {
    pub url: String,
    pub kind: FetchKind,
    pub source_id: i64,
    pub feed_id: i64,
}

/// Drives a single ingestion run against the catalog.
pub struct IngestionWorker {
    catalog: CatalogClient,
    http: reqwest::Client,
    urls: Vec<String>,
    options: ScrapeOptions,
}

impl IngestionWorker {
    pub fn new(
        catalog: CatalogClient,
        http: reqwest::Client,
        urls: Vec<String>,
        options: ScrapeOptions,
    ) -> Self {
        tracing::info!(urls = urls.len(), "Initialized ingestion worker");
        Self {
            catalog,
            http,
            urls,
            options,
        }
    }

    /// Runs health check, login, registration, harvesting and submission.
    ///
    /// Never returns early with an error: aborts are reported through
    /// [`RunStatus::Error`] in the summary.
    pub async fn run(&self) -> RunSummary {
        let summary = RunSummary::new(Utc::now(), self.urls.len());
        tracing::info!(urls = self.urls.len(), "Starting ingestion run");

        if !self.catalog.health_check().await {
            return summary.failed("API unavailable");
        }
        if let Err(e) = self.catalog.login().await {
            return summary.failed(&e.to_string());
        }

        let registered = self.register_all().await;
        let mut summary = RunSummary {
            feeds_created: registered.len(),
            ..summary
        };
        if registered.is_empty() {
            return summary.failed("No feeds created");
        }
        tracing::info!(feeds = registered.len(), "Registered feeds");

        let harvested: Vec<(RegisteredFeed, Vec<NormalizedArticle>)> = stream::iter(registered)
            .map(|feed| async move {
                let articles = harvest_url(&self.http, &feed.url, feed.kind, &self.options).await;
                (feed, articles)
            })
            .buffered(MAX_CONCURRENT_URLS)
            .collect()
            .await;

        let mut batch = Vec::new();
        for (feed, articles) in harvested {
            tracing::info!(
                url = %feed.url,
                feed_id = feed.feed_id,
                count = articles.len(),
                "Harvested articles"
            );
            *summary.feed_stats.entry(feed.url.clone()).or_default() += articles.len();
            batch.extend(articles.into_iter().map(|article| TaggedArticle {
                article,
                feed_id: feed.feed_id,
            }));
        }
        summary.articles_fetched = batch.len();

        if batch.is_empty() {
            tracing::warn!("No articles harvested from any URL");
            return summary.finish();
        }

        let result = self.catalog.create_articles_batch(batch).await;
        summary.articles_posted = result.successful.len();
        summary.articles_failed = result.failed.len();

        for failure in result.failed.iter().take(MAX_LOGGED_FAILURES) {
            tracing::warn!(
                title = %failure.article.title,
                error = %failure.error,
                "Article rejected"
            );
        }
        if result.failed.len() > MAX_LOGGED_FAILURES {
            tracing::warn!(
                more = result.failed.len() - MAX_LOGGED_FAILURES,
                "Further article rejections not shown"
            );
        }

        let summary = summary.finish();
        tracing::info!(
            duration_seconds = summary.duration_seconds,
            feeds = summary.feeds_created,
            posted = summary.articles_posted,
            fetched = summary.articles_fetched,
            "Ingestion run completed"
        );
        summary
    }

    async fn register_all(&self) -> Vec<RegisteredFeed> {
        let mut registered = Vec::new();
        for url in &self.urls {
            match self.register(url).await {
                Ok(feed) => registered.push(feed),
                Err(e) => {
                    tracing::error!(url = %url, error = %e, "Failed to register URL, skipping");
                }
            }
        }
        registered
    }

    async fn register(&self, url: &str) -> Result<RegisteredFeed, crate::api::ApiError> {
        let kind = classify_fetch_kind(url);
        let source_id = self
            .catalog
            .create_source(url, SourceType::from(kind))
            .await?;
        let feed_id = self
            .catalog
            .create_feed(url, source_id, FeedType::from(kind))
            .await?;
        Ok(RegisteredFeed {
            url: url.to_string(),
            kind,
            source_id,
            feed_id,
        })
    }
}

/// Harvests one URL through the extractor matching `kind`.
///
/// Failures are logged and yield no articles.
pub async fn harvest_url(
    http: &reqwest::Client,
    url: &str,
    kind: FetchKind,
    options: &ScrapeOptions,
) -> Vec<NormalizedArticle> {
    let result = match kind {
        FetchKind::Feed => fetch_feed(http, url, options.timeout)
            .await
            .map_err(|e| e.to_string()),
        FetchKind::Page => scrape_page(http, url, options)
            .await
            .map_err(|e| e.to_string()),
    };

    result.unwrap_or_else(|e| {
        tracing::error!(url = %url, kind = ?kind, error = %e, "Failed to harvest URL");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::CatalogSettings;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const RSS: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>Wire</title>
  <item><title>First</title><link>https://example.com/first</link></item>
  <item><title>Second</title><link>https://example.com/second</link></item>
</channel></rss>"#;

    fn worker(server: &MockServer, urls: Vec<String>) -> IngestionWorker {
        let catalog = CatalogClient::new(
            reqwest::Client::new(),
            CatalogSettings {
                base_url: server.uri(),
                username: Some("worker".into()),
                password: Some("pw".to_string().into()),
                timeout: Duration::from_secs(5),
                retry_base_delay: Duration::from_millis(1),
                ..CatalogSettings::default()
            },
        );
        let options = ScrapeOptions {
            timeout: Duration::from_secs(5),
            ..ScrapeOptions::default()
        };
        IngestionWorker::new(catalog, reqwest::Client::new(), urls, options)
    }

    async fn mount_catalog(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/api/v1/articles"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "content": [] })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t" })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/sources"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 1 })))
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/feeds"))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 7 })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_run_aborts_when_unhealthy() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let summary = worker(&server, vec!["https://example.com/rss".into()])
            .run()
            .await;
        assert_eq!(summary.status, RunStatus::Error);
        assert_eq!(summary.error.as_deref(), Some("API unavailable"));
        assert_eq!(summary.feeds_created, 0);
    }

    #[tokio::test]
    async fn test_run_aborts_when_nothing_registers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/articles"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "token": "t" })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/sources"))
            .respond_with(ResponseTemplate::new(400).set_body_string("bad"))
            .mount(&server)
            .await;

        let summary = worker(&server, vec!["https://example.com/rss".into()])
            .run()
            .await;
        assert!(!summary.is_success());
        assert_eq!(summary.error.as_deref(), Some("No feeds created"));
    }

    #[tokio::test]
    async fn test_run_registers_harvests_and_submits() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;
        Mock::given(method("GET"))
            .and(path("/feed.xml"))
            .respond_with(ResponseTemplate::new(200).set_body_string(RSS))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/articles"))
            .and(body_partial_json(json!({ "feedId": 7, "feedTitle": "Wire" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 100 })))
            .expect(2)
            .mount(&server)
            .await;

        let feed_url = format!("{}/feed.xml", server.uri());
        let summary = worker(&server, vec![feed_url.clone()]).run().await;

        assert!(summary.is_success());
        assert_eq!(summary.feeds_created, 1);
        assert_eq!(summary.feed_stats.get(&feed_url), Some(&2));
        assert_eq!(summary.articles_fetched, 2);
        assert_eq!(summary.articles_posted, 2);
        assert_eq!(summary.articles_failed, 0);
    }

    #[tokio::test]
    async fn test_page_urls_register_as_news() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/sources"))
            .and(body_partial_json(json!({ "sourceType": "NEWS" })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 2 })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/v1/feeds"))
            .and(body_partial_json(json!({ "feedType": "OTHER", "sourceId": 2 })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({ "id": 8 })))
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/2024/05/story", server.uri());
        let feed = worker(&server, vec![]).register(&url).await.unwrap();
        assert_eq!(feed.kind, FetchKind::Page);
        assert_eq!(feed.feed_id, 8);
    }

    #[tokio::test]
    async fn test_failed_fetch_counts_zero() {
        let server = MockServer::start().await;
        mount_catalog(&server).await;
        Mock::given(method("GET"))
            .and(path("/broken.rss"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let url = format!("{}/broken.rss", server.uri());
        let summary = worker(&server, vec![url.clone()]).run().await;

        assert!(summary.is_success());
        assert_eq!(summary.feed_stats.get(&url), Some(&0));
        assert_eq!(summary.articles_posted, 0);
    }

    #[test]
    fn test_summary_serializes_status_lowercase() {
        let summary = RunSummary::new(Utc::now(), 3).finish();
        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["status"], "success");
        assert!(value.get("error").is_none());
        assert_eq!(value["urls_processed"], 3);
    }
}
