//! Web page extraction.
//!
//! - [`classify`] - feed-vs-page and listing-vs-article heuristics
//! - [`links`] - same-site article link discovery on listing pages
//! - [`extract`] - field extraction from one parsed document (no I/O)
//! - [`page`] - fetching, listing detection and bounded fan-out
//!
//! Everything except [`page`] works on an already-parsed [`scraper::Html`]
//! and is testable without a network.

pub mod classify;
pub mod extract;
pub mod links;
pub mod page;

pub use classify::{classify_fetch_kind, is_listing_page, LISTING_LINK_THRESHOLD};
pub use extract::extract_article;
pub use links::{extract_article_links, is_article_link};
pub use page::{scrape_article, scrape_page, ScrapeError, ScrapeOptions, DEFAULT_MAX_ARTICLES};
