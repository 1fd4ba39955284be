//! String matching helpers shared by the resolver strategies.
//!
//! All returned ranges are byte ranges into the searched text. Case folding is
//! done one character at a time and always yields exactly one character, so a
//! folded match has the same character count as the text it came from and its
//! offsets can be mapped back without drift.

use std::sync::OnceLock;

use regex::Regex;

fn whitespace_run() -> &'static Regex {
    static WHITESPACE_RUN: OnceLock<Regex> = OnceLock::new();
    WHITESPACE_RUN.get_or_init(|| Regex::new(r"\s+").expect("Invalid whitespace regex"))
}

fn blank_lines() -> &'static Regex {
    static BLANK_LINES: OnceLock<Regex> = OnceLock::new();
    BLANK_LINES
        .get_or_init(|| Regex::new(r"\r?\n(?:[ \t]*\r?\n)+").expect("Invalid blank line regex"))
}

/// Collapse every whitespace run to a single space and trim both ends.
pub fn normalize_whitespace(text: &str) -> String {
    whitespace_run().replace_all(text, " ").trim().to_string()
}

/// Byte ranges of the blank-line runs separating paragraphs.
pub(crate) fn paragraph_separators(text: &str) -> Vec<std::ops::Range<usize>> {
    blank_lines().find_iter(text).map(|m| m.range()).collect()
}

pub(crate) fn fold_char(c: char) -> char {
    c.to_lowercase().next().unwrap_or(c)
}

/// First literal occurrence of `needle`.
pub fn find_exact(haystack: &str, needle: &str) -> Option<std::ops::Range<usize>> {
    if needle.is_empty() {
        return None;
    }
    haystack.find(needle).map(|start| start..start + needle.len())
}

/// First occurrence of `needle` ignoring case.
pub fn find_folded(haystack: &str, needle: &str) -> Option<std::ops::Range<usize>> {
    let start_char = folded_char_index(haystack, needle)?;
    let len_chars = needle.chars().count();
    Some(char_to_byte(haystack, start_char)..char_to_byte(haystack, start_char + len_chars))
}

/// Character index of the first case-insensitive occurrence of `needle`.
pub(crate) fn folded_char_index(haystack: &str, needle: &str) -> Option<usize> {
    let hay: Vec<char> = haystack.chars().map(fold_char).collect();
    let pattern: Vec<char> = needle.chars().map(fold_char).collect();
    if pattern.is_empty() || pattern.len() > hay.len() {
        return None;
    }
    hay.windows(pattern.len()).position(|window| window == pattern)
}

/// Byte offset of the character at `char_index`, or the text length when the
/// index is at or past the end.
pub(crate) fn char_to_byte(text: &str, char_index: usize) -> usize {
    text.char_indices()
        .nth(char_index)
        .map_or(text.len(), |(byte, _)| byte)
}

/// Find `normalized_target` inside the whitespace-collapsed form of `text`
/// (ignoring case) and return the matching byte range of the untouched text.
///
/// The walk keeps a counter of positions in the collapsed text: it advances
/// once per non-whitespace character and once per whitespace run, counting only
/// the run's first character and skipping runs before the first
/// non-whitespace character. That is exactly how `normalize_whitespace` builds
/// the collapsed text, so both sides agree on every position.
pub fn find_normalized(text: &str, normalized_target: &str) -> Option<std::ops::Range<usize>> {
    let normalized_text = normalize_whitespace(text);
    let match_start = folded_char_index(&normalized_text, normalized_target)?;
    let match_len = normalized_target.chars().count();

    let mut normalized_pos = 0;
    let mut in_whitespace = false;
    let mut start = None;

    for (byte, c) in text.char_indices() {
        if c.is_whitespace() {
            if normalized_pos > 0 && !in_whitespace {
                normalized_pos += 1;
            }
            in_whitespace = true;
            continue;
        }
        in_whitespace = false;

        if start.is_none() && normalized_pos == match_start {
            start = Some(byte);
        }
        normalized_pos += 1;

        if let Some(start) = start
            && normalized_pos >= match_start + match_len
        {
            return Some(start..byte + c.len_utf8());
        }
    }
    None
}

/// Shortens `text` to at most `max` characters with a "..." suffix, for logs.
pub fn preview(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// The first one to three words longer than two characters, joined by single
/// spaces. Empty when no word qualifies.
pub fn leading_words(text: &str) -> String {
    text.split_whitespace()
        .filter(|word| word.chars().count() > 2)
        .take(3)
        .collect::<Vec<_>>()
        .join(" ")
}
