//! Utility functions shared by the feed and page extractors.
//!
//! - **URL validation**: absolute-URL gate plus domain/base-URL derivation
//! - **Text processing**: control-character stripping and blank-to-`None` trimming
//! - **Dates**: best-effort normalisation of heterogeneous date strings
//!
//! # Examples
//!
//! ```
//! use harvest::util::{domain_from_str, normalize_date, validate_url};
//!
//! let url = validate_url("https://example.com/feed.xml").unwrap();
//! assert_eq!(domain_from_str(url.as_str()), "example.com");
//! assert_eq!(normalize_date("2024/03/01"), "2024-03-01T00:00:00");
//! ```

mod date;
mod text;
mod url_validator;

pub use date::{normalize_date, ISO_FORMAT};
pub use text::{char_len, non_empty, strip_control_chars};
pub use url_validator::{
    base_url_of, domain_from_str, domain_of, is_valid_url, validate_url, UrlValidationError,
    UNKNOWN_DOMAIN,
};
