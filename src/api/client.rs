use crate::api::types::{
    ArticleSubmission, BatchResult, Created, FailedArticle, FeedRequest, FeedType, LoginRequest,
    LoginResponse, SourceRequest, SourceType, TaggedArticle,
};
use crate::article::NormalizedArticle;
use crate::util::{base_url_of, domain_of, validate_url};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

const LOGIN_PATH: &str = "/api/v1/auth/login";
const SOURCES_PATH: &str = "/api/v1/sources";
const FEEDS_PATH: &str = "/api/v1/feeds";
const ARTICLES_PATH: &str = "/api/v1/articles";
const HEALTH_PATH: &str = "/api/v1/articles?page=0&size=1";

/// Retries after a 5xx response, on top of the first attempt.
const MAX_SERVER_RETRIES: u32 = 3;

/// Longest error body kept in an [`ApiError`] message.
const MAX_ERROR_BODY_CHARS: usize = 200;

#[derive(Debug, Error)]
pub enum ApiError {
    /// Rejected locally before any request was made.
    #[error("Invalid request: {0}")]
    Validation(String),
    /// Login failed or credentials are missing.
    #[error("Authentication failed: {0}")]
    Auth(String),
    /// 4xx response other than a recovered 401.
    #[error("Request rejected with status {status}: {message}")]
    Client { status: u16, message: String },
    /// 5xx response after retries were exhausted.
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

/// Connection settings for [`CatalogClient`].
#[derive(Debug)]
pub struct CatalogSettings {
    /// Base URL of the catalog service, without a trailing path.
    pub base_url: String,
    pub username: Option<String>,
    pub password: Option<SecretString>,
    /// Per-request timeout.
    pub timeout: Duration,
    /// First backoff step for 5xx retries; doubles on each retry.
    pub retry_base_delay: Duration,
    pub crawl_frequency_minutes: u32,
    pub feed_priority: u32,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            username: None,
            password: None,
            timeout: Duration::from_secs(30),
            retry_base_delay: Duration::from_secs(1),
            crawl_frequency_minutes: 60,
            feed_priority: 10,
        }
    }
}

/// Authenticated client for the article catalog.
///
/// Holds a bearer token obtained from [`login`](Self::login). A 401 on any
/// call triggers exactly one re-login and one retry of that call.
pub struct CatalogClient {
    http: reqwest::Client,
    settings: CatalogSettings,
    token: RwLock<Option<SecretString>>,
}

impl CatalogClient {
    pub fn new(http: reqwest::Client, mut settings: CatalogSettings) -> Self {
        settings.base_url = settings.base_url.trim_end_matches('/').to_string();
        Self {
            http,
            settings,
            token: RwLock::new(None),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.settings.base_url, path)
    }

    /// Exchanges the configured credentials for a bearer token.
    pub async fn login(&self) -> Result<(), ApiError> {
        let (Some(username), Some(password)) =
            (&self.settings.username, &self.settings.password)
        else {
            return Err(ApiError::Auth("username and password are required".into()));
        };

        tracing::info!(username = %username, "Logging in to catalog");
        let body = serde_json::to_vec(&LoginRequest {
            username_or_email: username,
            password: password.expose_secret(),
        })?;

        let response = self.send(Method::POST, LOGIN_PATH, Some(&body), false).await?;
        let status = response.status();
        let bytes = self.read_body(response).await?;

        if status != StatusCode::OK {
            tracing::error!(status = %status, "Login rejected");
            return Err(ApiError::Auth(format!(
                "login returned status {}: {}",
                status.as_u16(),
                body_excerpt(&bytes)
            )));
        }

        let token = serde_json::from_slice::<LoginResponse>(&bytes)?
            .token
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Auth("no token in login response".into()))?;

        *self.token.write().await = Some(SecretString::from(token));
        tracing::info!("Login successful");
        Ok(())
    }

    /// Checks the article listing. Any status below 500 counts as healthy;
    /// transport failures count as unhealthy.
    pub async fn health_check(&self) -> bool {
        match self.send(Method::GET, HEALTH_PATH, None, true).await {
            Ok(response) if response.status().is_server_error() => {
                tracing::warn!(status = %response.status(), "Catalog health check failed");
                false
            }
            Ok(_) => {
                tracing::info!("Catalog health check passed");
                true
            }
            Err(e) => {
                tracing::error!(error = %e, "Catalog health check failed");
                false
            }
        }
    }

    /// Registers the source that owns `feed_url` and returns its id.
    ///
    /// The source is named after the URL's domain.
    pub async fn create_source(
        &self,
        feed_url: &str,
        source_type: SourceType,
    ) -> Result<i64, ApiError> {
        let url = validate_url(feed_url).map_err(|e| ApiError::Validation(e.to_string()))?;
        let request = SourceRequest {
            name: domain_of(&url),
            base_url: base_url_of(&url),
            is_active: true,
            source_type,
        };
        tracing::info!(domain = %request.name, "Creating source");

        let created: Created = self.post(SOURCES_PATH, &request).await?;
        tracing::info!(source_id = created.id, domain = %request.name, "Created source");
        Ok(created.id)
    }

    /// Registers `feed_url` under `source_id` and returns the feed id.
    pub async fn create_feed(
        &self,
        feed_url: &str,
        source_id: i64,
        feed_type: FeedType,
    ) -> Result<i64, ApiError> {
        let request = FeedRequest {
            source_id,
            feed_url,
            feed_type,
            topic_id: None,
            crawl_frequency_minutes: self.settings.crawl_frequency_minutes,
            is_active: true,
            priority: self.settings.feed_priority,
        };
        tracing::info!(url = %feed_url, source_id = source_id, "Creating feed");

        let created: Created = self.post(FEEDS_PATH, &request).await?;
        tracing::info!(feed_id = created.id, url = %feed_url, "Created feed");
        Ok(created.id)
    }

    /// Submits one article. Mandatory fields are checked before any I/O.
    pub async fn create_article(
        &self,
        article: &NormalizedArticle,
        feed_id: i64,
    ) -> Result<i64, ApiError> {
        validate_article(article)?;

        let created: Created = self
            .post(ARTICLES_PATH, &ArticleSubmission { article, feed_id })
            .await?;
        tracing::debug!(article_id = created.id, title = %article.title, "Created article");
        Ok(created.id)
    }

    /// Submits each article independently; one rejection never stops the rest.
    pub async fn create_articles_batch(&self, articles: Vec<TaggedArticle>) -> BatchResult {
        tracing::info!(count = articles.len(), "Submitting article batch");
        let mut result = BatchResult::default();

        for TaggedArticle { article, feed_id } in articles {
            match self.create_article(&article, feed_id).await {
                Ok(id) => result.successful.push(id),
                Err(error) => {
                    tracing::warn!(title = %article.title, error = %error, "Failed to submit article");
                    result.failed.push(FailedArticle { article, error });
                }
            }
        }

        tracing::info!(
            successful = result.successful.len(),
            failed = result.failed.len(),
            "Batch complete"
        );
        result
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let body = serde_json::to_vec(body)?;
        let response = self.execute(Method::POST, path, Some(&body)).await?;
        let status = response.status();
        let bytes = self.read_body(response).await?;

        if status.is_success() {
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let message = body_excerpt(&bytes);
        tracing::error!(path = %path, status = %status, message = %message, "Catalog request failed");
        let status = status.as_u16();
        Err(match status {
            401 | 403 => ApiError::Auth(format!("status {status}: {message}")),
            500.. => ApiError::Server { status, message },
            _ => ApiError::Client { status, message },
        })
    }

    /// Sends a request, re-logging in once on 401 and backing off on 5xx.
    async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
    ) -> Result<reqwest::Response, ApiError> {
        let mut relogged = false;
        let mut retries = 0;

        loop {
            let response = self.send(method.clone(), path, body, true).await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && !relogged {
                tracing::warn!(path = %path, "Received 401, logging in again");
                self.login().await?;
                relogged = true;
                continue;
            }

            if status.is_server_error() && retries < MAX_SERVER_RETRIES {
                let delay = self.settings.retry_base_delay * (1u32 << retries);
                tracing::debug!(
                    path = %path,
                    status = %status,
                    retry = retries + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Retrying after server error"
                );
                tokio::time::sleep(delay).await;
                retries += 1;
                continue;
            }

            return Ok(response);
        }
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&[u8]>,
        authenticated: bool,
    ) -> Result<reqwest::Response, ApiError> {
        let mut request = self.http.request(method, self.endpoint(path));
        if authenticated {
            if let Some(token) = self.token.read().await.as_ref() {
                request = request.bearer_auth(token.expose_secret());
            }
        }
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, "application/json")
                .body(body.to_vec());
        }

        let timeout = self.settings.timeout;
        tokio::time::timeout(timeout, request.send())
            .await
            .map_err(|_| ApiError::Timeout(timeout))?
            .map_err(ApiError::Network)
    }

    async fn read_body(&self, response: reqwest::Response) -> Result<Vec<u8>, ApiError> {
        let timeout = self.settings.timeout;
        let bytes = tokio::time::timeout(timeout, response.bytes())
            .await
            .map_err(|_| ApiError::Timeout(timeout))??;
        Ok(bytes.to_vec())
    }
}

fn validate_article(article: &NormalizedArticle) -> Result<(), ApiError> {
    if article.title.trim().is_empty() {
        return Err(ApiError::Validation("article title is empty".into()));
    }
    let url = &article.original_url;
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ApiError::Validation(format!("invalid article URL: {url}")));
    }
    Ok(())
}

fn body_excerpt(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .chars()
        .take(MAX_ERROR_BODY_CHARS)
        .collect()
}
