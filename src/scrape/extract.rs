//! Field extraction from a single parsed HTML document.
//!
//! Every field is an ordered list of lookups evaluated top to bottom; the
//! first lookup that yields a non-blank value wins. Lookups never fail: a
//! missing field degrades to `None` or an empty string.

use crate::article::NormalizedArticle;
use crate::util::{char_len, domain_of, non_empty, normalize_date};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use url::Url;

/// A container's paragraph text must be longer than this to be accepted.
const MIN_CONTENT_CHARS: usize = 200;

type DocLookup = fn(&Html) -> Option<String>;

/// `(attribute, value)` pairs identifying a `<meta>` tag.
type MetaKey = (&'static str, &'static str);

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

fn meta_selectors(keys: &[MetaKey]) -> Vec<Selector> {
    keys.iter()
        .map(|(attr, value)| {
            Selector::parse(&format!(r#"meta[{attr}="{value}"]"#))
                .expect("static meta selector is valid")
        })
        .collect()
}

static H1: LazyLock<Selector> = LazyLock::new(|| selector("h1"));
static TITLE: LazyLock<Selector> = LazyLock::new(|| selector("title"));
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| selector("p"));
static NON_CONTENT: LazyLock<Selector> =
    LazyLock::new(|| selector("script, style, nav, header, footer, aside, iframe"));
static CONTENT_CONTAINERS: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [
        "article",
        "[role=\"main\"]",
        ".article-content",
        ".post-content",
        ".entry-content",
        ".content-body",
        ".article-body",
        "main",
        ".main-content",
    ]
    .into_iter()
    .map(selector)
    .collect()
});
static SCHEMA_AUTHOR: LazyLock<Selector> = LazyLock::new(|| selector("[itemprop=\"author\"]"));
static SCHEMA_NAME: LazyLock<Selector> = LazyLock::new(|| selector("[itemprop=\"name\"]"));
static SCHEMA_DATE: LazyLock<Selector> =
    LazyLock::new(|| selector("[itemprop=\"datePublished\"]"));
static TIME: LazyLock<Selector> = LazyLock::new(|| selector("time[datetime]"));
static BYLINES: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    [".author", ".byline", ".by-author", ".article-author"]
        .into_iter()
        .map(selector)
        .collect()
});
static BYLINE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(by|author:?)\s+").expect("static pattern is valid"));
static TITLE_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[|-]").expect("static pattern is valid"));

static TITLE_META: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    meta_selectors(&[
        ("property", "og:title"),
        ("name", "twitter:title"),
        ("property", "article:title"),
    ])
});

static DESCRIPTION_META: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    meta_selectors(&[
        ("property", "og:description"),
        ("name", "twitter:description"),
        ("name", "description"),
    ])
});

static AUTHOR_META: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    meta_selectors(&[
        ("name", "author"),
        ("property", "article:author"),
        ("name", "article:author"),
        ("property", "og:article:author"),
        ("name", "twitter:creator"),
        ("name", "parsely-author"),
        ("name", "sailthru.author"),
    ])
});

static DATE_META: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    meta_selectors(&[
        ("property", "article:published_time"),
        ("name", "article:published_time"),
        ("property", "og:published_time"),
        ("name", "publishdate"),
        ("name", "publish-date"),
        ("name", "date"),
        ("name", "DC.date.issued"),
        ("name", "parsely-pub-date"),
        ("name", "sailthru.date"),
    ])
});

static LANGUAGE_META: LazyLock<Vec<Selector>> = LazyLock::new(|| {
    meta_selectors(&[
        ("http-equiv", "content-language"),
        ("http-equiv", "Content-Language"),
    ])
});

const TITLE_CHAIN: &[DocLookup] = &[title_meta, first_h1, document_title];
const AUTHOR_CHAIN: &[DocLookup] = &[author_meta, schema_author, byline_class];
const DATE_CHAIN: &[DocLookup] = &[date_meta, schema_date, time_element];
const LANGUAGE_CHAIN: &[DocLookup] = &[root_lang, language_meta];

fn first_of(document: &Html, lookups: &[DocLookup]) -> Option<String> {
    lookups.iter().find_map(|lookup| lookup(document))
}

/// Builds the normalized record for a single article page.
///
/// `source` and `feed_title` are both the URL's domain: scraped pages have no
/// feed of their own.
pub fn extract_article(url: &Url, document: &Html) -> NormalizedArticle {
    let source = domain_of(url);

    NormalizedArticle {
        title: extract_title(url, document),
        original_url: url.to_string(),
        content: extract_content(document),
        description: extract_description(document),
        author: extract_author(document),
        publication_date: extract_publication_date(document),
        feed_title: source.clone(),
        source,
        language: extract_language(document),
    }
}

/// Meta tags, first `<h1>`, `<title>` up to the first `|` or `-`, then the
/// domain. Never empty for a URL with a host.
pub fn extract_title(url: &Url, document: &Html) -> String {
    first_of(document, TITLE_CHAIN).unwrap_or_else(|| domain_of(url))
}

pub fn extract_description(document: &Html) -> String {
    meta_chain(document, &DESCRIPTION_META).unwrap_or_default()
}

pub fn extract_author(document: &Html) -> Option<String> {
    first_of(document, AUTHOR_CHAIN)
}

/// Every candidate passes through [`normalize_date`].
pub fn extract_publication_date(document: &Html) -> Option<String> {
    first_of(document, DATE_CHAIN).map(|raw| normalize_date(&raw))
}

pub fn extract_language(document: &Html) -> Option<String> {
    first_of(document, LANGUAGE_CHAIN)
}

/// Main body text.
///
/// Non-content elements are detached from a copy of the document, then the
/// first content container whose paragraph text exceeds
/// [`MIN_CONTENT_CHARS`] wins. Otherwise every paragraph in the document is
/// joined.
pub fn extract_content(document: &Html) -> String {
    let cleaned = strip_non_content(document);
    // `Html::select` scans the whole node arena, detached nodes included;
    // walking from the root only visits the attached tree.
    let root = cleaned.root_element();

    for container_selector in CONTENT_CONTAINERS.iter() {
        let Some(container) = root.select(container_selector).next() else {
            continue;
        };
        let text = container_text(container);
        if char_len(&text) > MIN_CONTENT_CHARS {
            return text;
        }
    }

    join_paragraphs(root.select(&PARAGRAPH)).trim().to_owned()
}

fn strip_non_content(document: &Html) -> Html {
    let mut cleaned = document.clone();
    let ids: Vec<_> = cleaned.select(&NON_CONTENT).map(|el| el.id()).collect();
    for id in ids {
        if let Some(mut node) = cleaned.tree.get_mut(id) {
            node.detach();
        }
    }
    cleaned
}

/// Paragraphs of a container joined by blank lines; containers without any
/// `<p>` contribute their text nodes line by line.
fn container_text(container: ElementRef<'_>) -> String {
    let mut paragraphs = container.select(&PARAGRAPH).peekable();
    if paragraphs.peek().is_some() {
        return join_paragraphs(paragraphs);
    }
    container
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn join_paragraphs<'a>(paragraphs: impl Iterator<Item = ElementRef<'a>>) -> String {
    paragraphs
        .filter_map(|p| non_empty(&element_text(p)))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect()
}

fn meta_content(document: &Html, sel: &Selector) -> Option<String> {
    let meta = document.select(sel).next()?;
    meta.value().attr("content").and_then(non_empty)
}

fn meta_chain(document: &Html, selectors: &[Selector]) -> Option<String> {
    selectors.iter().find_map(|sel| meta_content(document, sel))
}

fn title_meta(document: &Html) -> Option<String> {
    meta_chain(document, &TITLE_META)
}

fn first_h1(document: &Html) -> Option<String> {
    let h1 = document.select(&H1).next()?;
    non_empty(&element_text(h1))
}

fn document_title(document: &Html) -> Option<String> {
    let title = document.select(&TITLE).next()?;
    let text = element_text(title);
    let head = TITLE_SEPARATOR.split(text.trim()).next()?;
    non_empty(head)
}

fn author_meta(document: &Html) -> Option<String> {
    meta_chain(document, &AUTHOR_META)
}

/// schema.org `itemprop="author"`, preferring a nested `itemprop="name"`.
fn schema_author(document: &Html) -> Option<String> {
    let author = document.select(&SCHEMA_AUTHOR).next()?;
    if let Some(name) = author.select(&SCHEMA_NAME).next() {
        if let Some(name) = non_empty(&element_text(name)) {
            return Some(name);
        }
    }
    non_empty(&element_text(author))
}

fn byline_class(document: &Html) -> Option<String> {
    BYLINES.iter().find_map(|sel| {
        let element = document.select(sel).next()?;
        let text = element_text(element);
        non_empty(&BYLINE_PREFIX.replace(text.trim(), ""))
    })
}

fn date_meta(document: &Html) -> Option<String> {
    meta_chain(document, &DATE_META)
}

fn schema_date(document: &Html) -> Option<String> {
    let element = document.select(&SCHEMA_DATE).next()?;
    let value = element.value();
    value
        .attr("content")
        .or_else(|| value.attr("datetime"))
        .and_then(non_empty)
}

fn time_element(document: &Html) -> Option<String> {
    let time = document.select(&TIME).next()?;
    time.value().attr("datetime").and_then(non_empty)
}

fn root_lang(document: &Html) -> Option<String> {
    document.root_element().value().attr("lang").and_then(non_empty)
}

fn language_meta(document: &Html) -> Option<String> {
    meta_chain(document, &LANGUAGE_META)
}
