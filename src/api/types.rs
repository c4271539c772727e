//! Request and response bodies for the catalog API.

use crate::api::ApiError;
use crate::article::{FetchKind, NormalizedArticle};
use serde::{Deserialize, Serialize};

/// Backend classification of a news source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceType {
    Rss,
    News,
}

/// Backend classification of a feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeedType {
    Rss,
    Other,
}

impl From<FetchKind> for SourceType {
    fn from(kind: FetchKind) -> Self {
        match kind {
            FetchKind::Feed => SourceType::Rss,
            FetchKind::Page => SourceType::News,
        }
    }
}

impl From<FetchKind> for FeedType {
    fn from(kind: FetchKind) -> Self {
        match kind {
            FetchKind::Feed => FeedType::Rss,
            FetchKind::Page => FeedType::Other,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LoginRequest<'a> {
    pub username_or_email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Deserialize)]
pub(crate) struct LoginResponse {
    pub token: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SourceRequest {
    pub name: String,
    pub base_url: String,
    pub is_active: bool,
    pub source_type: SourceType,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FeedRequest<'a> {
    pub source_id: i64,
    pub feed_url: &'a str,
    pub feed_type: FeedType,
    pub topic_id: Option<i64>,
    pub crawl_frequency_minutes: u32,
    pub is_active: bool,
    pub priority: u32,
}

/// An article as posted to the catalog: every article field plus its feed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ArticleSubmission<'a> {
    #[serde(flatten)]
    pub article: &'a NormalizedArticle,
    pub feed_id: i64,
}

/// Body returned by every create endpoint. Only the id is used.
#[derive(Debug, Deserialize)]
pub(crate) struct Created {
    pub id: i64,
}

/// An article paired with the feed it was harvested from.
#[derive(Debug, Clone, PartialEq)]
pub struct TaggedArticle {
    pub article: NormalizedArticle,
    pub feed_id: i64,
}

/// An article the catalog did not accept.
#[derive(Debug)]
pub struct FailedArticle {
    pub article: NormalizedArticle,
    pub error: ApiError,
}

/// Outcome of [`CatalogClient::create_articles_batch`](crate::api::CatalogClient::create_articles_batch).
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Ids of the created articles, in submission order.
    pub successful: Vec<i64>,
    pub failed: Vec<FailedArticle>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn article() -> NormalizedArticle {
        NormalizedArticle {
            title: "Title".into(),
            original_url: "https://example.com/a".into(),
            content: "Body".into(),
            description: String::new(),
            author: None,
            publication_date: None,
            source: "example.com".into(),
            feed_title: "Example".into(),
            language: Some("en".into()),
        }
    }

    #[test]
    fn test_submission_flattens_article_with_feed_id() {
        let article = article();
        let value = serde_json::to_value(ArticleSubmission {
            article: &article,
            feed_id: 7,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "title": "Title",
                "originalUrl": "https://example.com/a",
                "content": "Body",
                "description": "",
                "author": null,
                "publicationDate": null,
                "source": "example.com",
                "feedTitle": "Example",
                "language": "en",
                "feedId": 7,
            })
        );
    }

    #[test]
    fn test_feed_request_shape() {
        let value = serde_json::to_value(FeedRequest {
            source_id: 3,
            feed_url: "https://example.com/rss",
            feed_type: FeedType::Rss,
            topic_id: None,
            crawl_frequency_minutes: 60,
            is_active: true,
            priority: 10,
        })
        .unwrap();
        assert_eq!(
            value,
            json!({
                "sourceId": 3,
                "feedUrl": "https://example.com/rss",
                "feedType": "RSS",
                "topicId": null,
                "crawlFrequencyMinutes": 60,
                "isActive": true,
                "priority": 10,
            })
        );
    }

    #[test]
    fn test_types_follow_fetch_kind() {
        assert_eq!(SourceType::from(FetchKind::Feed), SourceType::Rss);
        assert_eq!(SourceType::from(FetchKind::Page), SourceType::News);
        assert_eq!(FeedType::from(FetchKind::Page), FeedType::Other);
        assert_eq!(serde_json::to_value(SourceType::News).unwrap(), json!("NEWS"));
        assert_eq!(serde_json::to_value(FeedType::Other).unwrap(), json!("OTHER"));
    }
}
