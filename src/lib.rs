//! Harvest: news ingestion into one article schema.
//!
//! RSS/Atom feeds and scraped web pages are normalized into
//! [`NormalizedArticle`](article::NormalizedArticle) records, then
//! registered and submitted to the article catalog by the
//! [`IngestionWorker`](worker::IngestionWorker).

pub mod api;
pub mod article;
pub mod config;
pub mod feed;
pub mod fetch;
pub mod scrape;
pub mod util;
pub mod worker;
