use crate::util::domain_of;
use regex::RegexSet;
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

static ANCHORS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("static selector is valid"));

/// Paths that are never articles: taxonomy, account, legal and media.
static EXCLUDE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"/tag/",
        r"/category/",
        r"/author/",
        r"/search",
        r"/login",
        r"/register",
        r"/about",
        r"/contact",
        r"/privacy",
        r"/terms",
        r"/advertise",
        r"/subscribe",
        r"\.(pdf|jpg|jpeg|png|gif|mp3|mp4|zip)$",
    ])
    .expect("static patterns are valid")
});

/// Paths that look like an article.
static INCLUDE: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"/\d{4}/\d{2}/",
        r"/article/",
        r"/post/",
        r"/story/",
        r"/news/",
        r"/blog/",
        r"-\d+$",
    ])
    .expect("static patterns are valid")
});

/// Collects same-site article links from a listing page.
///
/// Every `<a href>` is resolved against `base`, deduplicated by exact
/// absolute-URL string and filtered with [`is_article_link`]. Document order
/// is preserved.
pub fn extract_article_links(base: &Url, document: &Html) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in document.select(&ANCHORS) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Ok(resolved) = base.join(href) else {
            continue;
        };
        if !is_article_link(&resolved, base) {
            continue;
        }
        let absolute = resolved.to_string();
        if seen.insert(absolute.clone()) {
            links.push(absolute);
        }
    }

    links
}

/// Decides whether `url` is likely an article on the same site as `base`.
///
/// Cross-domain links and links with a fragment are rejected outright.
/// Exclusions are checked before inclusions, so a path matching both is
/// rejected. Unclassified paths are accepted when they have at least two
/// segments and no trailing slash.
pub fn is_article_link(url: &Url, base: &Url) -> bool {
    if domain_of(url) != domain_of(base) {
        return false;
    }
    if url.fragment().is_some() {
        return false;
    }

    let path = url.path().to_lowercase();
    if EXCLUDE.is_match(&path) {
        return false;
    }
    if INCLUDE.is_match(&path) {
        return true;
    }

    if path.ends_with('/') {
        return false;
    }
    path.split('/').filter(|s| !s.is_empty()).count() >= 2
}
