use chrono::{NaiveDate, NaiveDateTime};

/// Only this many leading characters are considered; trailing offsets and
/// fractional seconds fall outside the window and are ignored.
const DATE_WINDOW: usize = 19;

const DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Output layout: ISO-8601 without offset, seconds always present.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Best-effort normalisation of a date string to ISO-8601.
///
/// The first 19 characters are tried against a fixed list of layouts
/// (`YYYY-MM-DDTHH:MM:SS[±HHMM]`, `YYYY-MM-DD HH:MM:SS`, `YYYY-MM-DD`,
/// `YYYY/MM/DD`). The first layout that parses wins and is re-emitted as
/// `YYYY-MM-DDTHH:MM:SS`. If nothing parses the input is returned
/// unchanged, so callers must treat the result as "ISO-8601 or opaque".
///
/// ```
/// use harvest::util::normalize_date;
///
/// assert_eq!(normalize_date("2024-01-15"), "2024-01-15T00:00:00");
/// assert_eq!(normalize_date("2024-01-15T10:30:00+0200"), "2024-01-15T10:30:00");
/// assert_eq!(normalize_date("not-a-date"), "not-a-date");
/// ```
pub fn normalize_date(raw: &str) -> String {
    let window: String = raw.chars().take(DATE_WINDOW).collect();

    let parsed = DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&window, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(&window, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        });

    match parsed {
        Some(dt) => dt.format(ISO_FORMAT).to_string(),
        None => {
            tracing::debug!(raw = %raw, "Unrecognised date format, passing through");
            raw.to_owned()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_full_timestamp() {
        assert_eq!(normalize_date("2024-01-15T10:30:00"), "2024-01-15T10:30:00");
    }

    #[test]
    fn test_offset_and_fraction_are_truncated() {
        assert_eq!(
            normalize_date("2024-01-15T10:30:00.123+05:00"),
            "2024-01-15T10:30:00"
        );
        assert_eq!(normalize_date("2024-01-15T10:30:00Z"), "2024-01-15T10:30:00");
    }

    #[test]
    fn test_space_separated() {
        assert_eq!(normalize_date("2024-01-15 08:05:09"), "2024-01-15T08:05:09");
    }

    #[test]
    fn test_date_only_formats() {
        assert_eq!(normalize_date("2024-01-15"), "2024-01-15T00:00:00");
        assert_eq!(normalize_date("2024/01/15"), "2024-01-15T00:00:00");
    }

    #[test]
    fn test_unparseable_passthrough() {
        assert_eq!(normalize_date("not-a-date"), "not-a-date");
        assert_eq!(normalize_date("invalid-date"), "invalid-date");
        assert_eq!(normalize_date(""), "");
        assert_eq!(
            normalize_date("Mon, 15 Jan 2024 10:00:00 GMT"),
            "Mon, 15 Jan 2024 10:00:00 GMT"
        );
    }

    #[test]
    fn test_non_ascii_input_does_not_panic() {
        assert_eq!(normalize_date("日付は二〇二四年一月十五日です。とても長い"), "日付は二〇二四年一月十五日です。とても長い");
    }

    proptest! {
        #[test]
        fn prop_normalize_is_idempotent(s in "\\PC{0,40}") {
            let once = normalize_date(&s);
            let twice = normalize_date(&once);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn prop_valid_timestamps_roundtrip(
            y in 1970i32..2100, m in 1u32..=12, d in 1u32..=28,
            h in 0u32..24, mi in 0u32..60, s in 0u32..60,
        ) {
            let iso = format!("{y:04}-{m:02}-{d:02}T{h:02}:{mi:02}:{s:02}");
            prop_assert_eq!(normalize_date(&iso), iso.clone());
        }
    }
}
