//! HTTP transport shared by the feed and page extractors.
//!
//! Extractors never retry: any [`FetchError`] is a single opaque "fetch
//! failed" signal to them. Retry discipline lives in the catalog client.

use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use std::time::Duration;
use thiserror::Error;

/// Maximum body size accepted for feeds and pages.
pub const MAX_DOCUMENT_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors raised while retrieving a document.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),
    /// Response body exceeded the size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

/// Builds the HTTP client used for every outbound fetch.
///
/// `user_agent` is the custom client identifier sent with each request.
pub fn build_client(user_agent: &str) -> Result<reqwest::Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    reqwest::Client::builder()
        .user_agent(user_agent)
        .default_headers(headers)
        .build()
}

/// Fetches `url` and returns the response body.
///
/// Fails on timeout, transport error, non-success status, or a body larger
/// than [`MAX_DOCUMENT_SIZE`].
pub async fn fetch_bytes(
    client: &reqwest::Client,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let response = tokio::time::timeout(timeout, client.get(url).send())
        .await
        .map_err(|_| FetchError::Timeout(timeout))?
        .map_err(FetchError::Network)?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!(url = %url, status = %status, "Non-success response");
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    tokio::time::timeout(timeout, read_limited_bytes(response, MAX_DOCUMENT_SIZE))
        .await
        .map_err(|_| FetchError::Timeout(timeout))?
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::Network)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[tokio::test]
    async fn test_fetch_success_sends_user_agent() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/page"))
            .and(header("user-agent", "Harvest-Test/1.0"))
            .respond_with(ResponseTemplate::new(200).set_body_string("hello"))
            .mount(&mock_server)
            .await;

        let client = build_client("Harvest-Test/1.0").unwrap();
        let body = fetch_bytes(&client, &format!("{}/page", mock_server.uri()), TIMEOUT)
            .await
            .unwrap();
        assert_eq!(body, b"hello");
    }

    #[tokio::test]
    async fn test_fetch_404_is_http_status() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let client = build_client("Harvest-Test/1.0").unwrap();
        let result = fetch_bytes(&client, &format!("{}/missing", mock_server.uri()), TIMEOUT).await;
        match result {
            Err(FetchError::HttpStatus(404)) => {}
            other => panic!("Expected HttpStatus(404), got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_timeout() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&mock_server)
            .await;

        let client = build_client("Harvest-Test/1.0").unwrap();
        let result = fetch_bytes(
            &client,
            &format!("{}/slow", mock_server.uri()),
            Duration::from_millis(50),
        )
        .await;
        assert!(matches!(result, Err(FetchError::Timeout(_))));
    }

    #[tokio::test]
    async fn test_fetch_oversized_body_rejected() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'a'; MAX_DOCUMENT_SIZE + 1]))
            .mount(&mock_server)
            .await;

        let client = build_client("Harvest-Test/1.0").unwrap();
        let result = fetch_bytes(&client, &format!("{}/big", mock_server.uri()), TIMEOUT).await;
        assert!(matches!(result, Err(FetchError::ResponseTooLarge)));
    }
}
