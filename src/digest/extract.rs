use crate::digest::util::take_chars;

/// Collapse whitespace runs into single spaces and trim both ends.
pub fn clean_page_text(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Cleaned text cut to at most `max_chars`. The cut is not re-trimmed, so a
/// cleaned text longer than the cap always yields exactly `max_chars`.
pub fn extract_page_text(raw: &str, max_chars: usize) -> String {
    take_chars(&clean_page_text(raw), max_chars).to_string()
}
