//! Client for the article catalog service.
//!
//! The catalog owns sources, feeds and articles. Every configured URL is
//! registered as a source plus a feed before its articles are submitted.

pub mod client;
pub mod types;

pub use client::{ApiError, CatalogClient, CatalogSettings};
pub use types::{BatchResult, FailedArticle, FeedType, SourceType, TaggedArticle};
