//! Raw value recovery for feeds.
//!
//! `feed-rs` only exposes dates it managed to parse, and lowercases the feed
//! language. This module re-reads the document with `quick-xml` and records
//! the raw `<pubDate>`/`<updated>` strings for each `<item>`/`<entry>` in
//! document order, plus the feed language exactly as written.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

/// Raw date strings found inside one feed entry.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawEntryDates {
    pub published: Option<String>,
    pub updated: Option<String>,
}

/// Everything recovered from one scan of a feed document.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RawFeedScan {
    /// Channel `<language>`, else the root `xml:lang` attribute.
    pub language: Option<String>,
    pub entries: Vec<RawEntryDates>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DateField {
    Published,
    Updated,
}

/// Element whose text is being collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Capture {
    Date(DateField),
    Language,
}

impl RawEntryDates {
    fn record(&mut self, field: DateField, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }
        let slot = match field {
            DateField::Published => &mut self.published,
            DateField::Updated => &mut self.updated,
        };
        // First occurrence wins (an Atom <source> may carry its own <updated>)
        if slot.is_none() {
            *slot = Some(text.to_owned());
        }
    }
}

fn is_entry(local_name: &[u8]) -> bool {
    matches!(local_name, b"item" | b"entry")
}

fn date_field(local_name: &[u8]) -> Option<DateField> {
    match local_name {
        // `date` covers Dublin Core `dc:date`
        b"pubDate" | b"published" | b"issued" | b"date" => Some(DateField::Published),
        b"updated" | b"modified" => Some(DateField::Updated),
        _ => None,
    }
}

fn non_blank(text: &str) -> Option<String> {
    let text = text.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

fn xml_lang(element: &BytesStart<'_>) -> Option<String> {
    let attr = element.try_get_attribute("xml:lang").ok()??;
    non_blank(&attr.unescape_value().ok()?)
}

/// Scans a feed document for raw entry dates and the feed language.
///
/// Returns an empty scan if the document is not well-formed XML; callers
/// treat the result as advisory only.
pub fn scan_raw(bytes: &[u8]) -> RawFeedScan {
    let mut reader = Reader::from_reader(bytes);
    reader.config_mut().trim_text(true);

    let mut entries = Vec::new();
    let mut current: Option<RawEntryDates> = None;
    let mut capture: Option<Capture> = None;
    let mut channel_language: Option<String> = None;
    let mut root_language: Option<String> = None;
    let mut seen_root = false;
    let mut text = String::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if !seen_root {
                    seen_root = true;
                    root_language = xml_lang(&e);
                }
                let name = e.local_name();
                if is_entry(name.as_ref()) {
                    current = Some(RawEntryDates::default());
                    capture = None;
                } else if current.is_some() {
                    capture = date_field(name.as_ref()).map(Capture::Date);
                    text.clear();
                } else if name.as_ref() == b"language" && channel_language.is_none() {
                    capture = Some(Capture::Language);
                    text.clear();
                }
            }
            Ok(Event::Empty(e)) if is_entry(e.local_name().as_ref()) => {
                entries.push(RawEntryDates::default());
            }
            Ok(Event::Text(t)) if capture.is_some() => {
                if let Ok(s) = t.unescape() {
                    text.push_str(&s);
                }
            }
            Ok(Event::CData(c)) if capture.is_some() => {
                text.push_str(&String::from_utf8_lossy(&c));
            }
            Ok(Event::End(e)) => {
                let name = e.local_name();
                if is_entry(name.as_ref()) {
                    if let Some(done) = current.take() {
                        entries.push(done);
                    }
                    capture = None;
                } else {
                    match capture {
                        Some(Capture::Date(f)) if date_field(name.as_ref()) == Some(f) => {
                            if let Some(entry) = current.as_mut() {
                                entry.record(f, &text);
                            }
                            capture = None;
                        }
                        Some(Capture::Language) if name.as_ref() == b"language" => {
                            channel_language = non_blank(&text);
                            capture = None;
                        }
                        _ => {}
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Raw feed scan aborted on malformed XML");
                return RawFeedScan::default();
            }
            _ => {}
        }
        buf.clear();
    }

    RawFeedScan {
        language: channel_language.or(root_language),
        entries,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rss_pub_dates_in_order() {
        let rss = br#"<?xml version="1.0"?>
<rss version="2.0"><channel>
  <pubDate>channel level, ignored</pubDate>
  <item><title>A</title><pubDate>sometime last week</pubDate></item>
  <item><title>B</title></item>
  <item><title>C</title><dc:date xmlns:dc="http://purl.org/dc/elements/1.1/">2024-02-01</dc:date></item>
</channel></rss>"#;
        let dates = scan_raw(rss).entries;
        assert_eq!(dates.len(), 3);
        assert_eq!(dates[0].published.as_deref(), Some("sometime last week"));
        assert_eq!(dates[1], RawEntryDates::default());
        assert_eq!(dates[2].published.as_deref(), Some("2024-02-01"));
    }

    #[test]
    fn test_atom_published_and_updated() {
        let atom = br#"<?xml version="1.0"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>First</title>
    <published>yesterday</published>
    <updated>today</updated>
  </entry>
</feed>"#;
        let dates = scan_raw(atom).entries;
        assert_eq!(dates.len(), 1);
        assert_eq!(dates[0].published.as_deref(), Some("yesterday"));
        assert_eq!(dates[0].updated.as_deref(), Some("today"));
    }

    #[test]
    fn test_malformed_xml_yields_nothing() {
        let scan = scan_raw(b"<rss><channel><language>en</language><item><pubDate>x</item></rss>");
        assert_eq!(scan, RawFeedScan::default());
    }

    #[test]
    fn test_channel_language_keeps_case() {
        let rss = br#"<rss version="2.0"><channel>
  <language>fr-FR</language>
  <item><title>A</title><language>de-DE</language></item>
</channel></rss>"#;
        let scan = scan_raw(rss);
        assert_eq!(scan.language.as_deref(), Some("fr-FR"));
        assert_eq!(scan.entries.len(), 1);
    }

    #[test]
    fn test_atom_root_xml_lang() {
        let atom = br#"<feed xmlns="http://www.w3.org/2005/Atom" xml:lang="pt-BR">
  <entry><title>A</title></entry>
</feed>"#;
        assert_eq!(scan_raw(atom).language.as_deref(), Some("pt-BR"));
    }
}
