//! Feed extraction: RSS/Atom documents into [`NormalizedArticle`] records.
//!
//! - [`parser`] - pure, network-free normalization of a fetched document
//! - [`fetcher`] - HTTP retrieval of one or many feeds
//! - `raw_scan` - raw date strings and language text the feed parser drops
//!
//! [`NormalizedArticle`]: crate::article::NormalizedArticle

pub mod fetcher;
pub mod parser;
mod raw_scan;

pub use fetcher::{fetch_feed, fetch_multiple_feeds, FeedError};
pub use parser::{parse_feed, EntryError, ParseResult};
