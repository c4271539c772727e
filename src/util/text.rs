use std::borrow::Cow;

fn is_stripped_control(c: char) -> bool {
    c.is_control() && !matches!(c, '\t' | '\n' | '\r')
}

/// Removes control characters (other than tab, newline and carriage return)
/// from feed- or page-supplied text.
///
/// Returns `Cow::Borrowed` when the input is already clean.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    if !s.chars().any(is_stripped_control) {
        return Cow::Borrowed(s);
    }
    Cow::Owned(s.chars().filter(|&c| !is_stripped_control(c)).collect())
}

/// Trims and sanitises a field value, mapping blank results to `None`.
///
/// Every extraction lookup funnels its candidate through this, so "present
/// but empty" and "absent" collapse to the same outcome.
pub fn non_empty(s: &str) -> Option<String> {
    let cleaned = strip_control_chars(s.trim());
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Number of characters (not bytes) in `s`.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
