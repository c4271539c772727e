use thiserror::Error;
use url::Url;

/// Fallback used wherever a domain cannot be derived from a URL.
pub const UNKNOWN_DOMAIN: &str = "unknown";

/// Errors that can occur during URL validation.
///
/// Every entry point (feed fetch, page scrape, source registration) gates on
/// [`validate_url`] before any network I/O is attempted.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed as an absolute URL.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL parsed but has no network location (e.g. `mailto:`, `data:`).
    #[error("URL has no host: {0}")]
    MissingHost(String),
}

/// Validates that a string is a well-formed absolute URL.
///
/// A URL is accepted when it has both a scheme and a network location.
/// Nothing else is checked here: reachability is the transport's problem.
///
/// # Examples
///
/// ```
/// use harvest::util::validate_url;
///
/// let url = validate_url("https://example.com/feed.xml").unwrap();
/// assert_eq!(url.host_str(), Some("example.com"));
///
/// assert!(validate_url("not-a-url").is_err());
/// assert!(validate_url("mailto:someone@example.com").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlValidationError::MissingHost(url_str.to_owned())),
    }
}

/// Boolean form of [`validate_url`].
pub fn is_valid_url(url_str: &str) -> bool {
    validate_url(url_str).is_ok()
}

/// Returns the network location of a parsed URL: host plus an explicit,
/// non-default port (`example.com`, `127.0.0.1:8080`).
pub fn domain_of(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default();
    match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_owned(),
    }
}

/// Domain of a URL string, or [`UNKNOWN_DOMAIN`] if it cannot be parsed.
pub fn domain_from_str(url_str: &str) -> String {
    match Url::parse(url_str) {
        Ok(url) if url.host_str().is_some_and(|h| !h.is_empty()) => domain_of(&url),
        _ => UNKNOWN_DOMAIN.to_owned(),
    }
}

/// `scheme://domain` for a parsed URL, used as a source's base URL.
pub fn base_url_of(url: &Url) -> String {
    format!("{}://{}", url.scheme(), domain_of(url))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_urls() {
        assert!(is_valid_url("https://example.com/article"));
        assert!(is_valid_url("http://example.com/page"));
        assert!(is_valid_url("http://127.0.0.1:8080/feed"));
    }

    #[test]
    fn test_invalid_urls() {
        assert!(!is_valid_url("not-a-url"));
        assert!(!is_valid_url(""));
        assert!(!is_valid_url("/relative/path"));
        assert!(!is_valid_url("mailto:someone@example.com"));
    }

    #[test]
    fn test_missing_host_error_variant() {
        let err = validate_url("data:text/plain,hello").unwrap_err();
        assert!(matches!(err, UrlValidationError::MissingHost(_)));
    }

    #[test]
    fn test_domain_extraction() {
        assert_eq!(domain_from_str("https://example.com/article"), "example.com");
        assert_eq!(
            domain_from_str("https://en.wikipedia.org/wiki/Python"),
            "en.wikipedia.org"
        );
        assert_eq!(domain_from_str("http://127.0.0.1:4000/x"), "127.0.0.1:4000");
    }

    #[test]
    fn test_domain_unknown_fallback() {
        assert_eq!(domain_from_str("garbage"), UNKNOWN_DOMAIN);
    }

    #[test]
    fn test_base_url() {
        let url = Url::parse("https://news.example.com/rss/world.xml").unwrap();
        assert_eq!(base_url_of(&url), "https://news.example.com");
    }

    #[test]
    fn test_default_port_is_dropped() {
        let url = Url::parse("https://example.com:443/feed.xml").unwrap();
        assert_eq!(domain_of(&url), "example.com");
    }
}
