//! Title/year extraction from filenames and free text, and the canonical
//! `"Title (Year)"` naming convention.
//!
//! Only a final parenthetical of exactly four ASCII digits is a year. Anything
//! else in parentheses (`"(20XX)"`, `"(PC)"`, `"(Director's Cut)"`) stays part of the title.

use std::sync::LazyLock;

use regex::Regex;

/// `"<title> (<yyyy>).<ext>"`, anchored at the end of the name.
static CANONICAL_FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) \(([0-9]{4})\)\.([^./\\\s]+)$").unwrap());

/// `"<title> (<yyyy>)"` stem without extension.
static CANONICAL_STEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+) \(([0-9]{4})\)$").unwrap());

/// Free text: trailing parenthesized year with optional surrounding whitespace.
static FREE_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\(([0-9]{4})\)\s*$").unwrap());

/// Result of parsing a document filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    pub title: String,
    pub year: Option<u16>,
    pub canonical: bool,
}

/// Parse a filename (with extension) into title, year and canonical flag.
///
/// Canonical names yield the text before `" (YYYY)"` as the title. Any other
/// name yields its whole stem as the title and no year.
pub fn parse_filename(name: &str) -> ParsedName {
    if let Some(caps) = CANONICAL_FILE_RE.captures(name) {
        if let Ok(year) = caps[2].parse::<u16>() {
            return ParsedName {
                title: caps[1].to_string(),
                year: Some(year),
                canonical: true,
            };
        }
    }

    ParsedName {
        title: file_stem(name).to_string(),
        year: None,
        canonical: false,
    }
}

/// Extract `(title, year)` from user input such as `"Loot (2022)"`.
pub fn parse_free_text(input: &str) -> (String, Option<u16>) {
    if let Some(caps) = FREE_TEXT_RE.captures(input) {
        if let Ok(year) = caps[2].parse::<u16>() {
            return (caps[1].trim().to_string(), Some(year));
        }
    }
    (input.trim().to_string(), None)
}

/// `true` when a stem (no extension) already ends in `" (YYYY)"`.
pub fn is_canonical_stem(stem: &str) -> bool {
    CANONICAL_STEM_RE.is_match(stem.trim())
}

/// Split a canonical stem into its base title and year.
pub fn split_canonical_stem(stem: &str) -> Option<(&str, u16)> {
    let caps = CANONICAL_STEM_RE.captures(stem)?;
    let year = caps[2].parse::<u16>().ok()?;
    let title = caps.get(1)?.as_str();
    Some((title, year))
}

/// Make a title safe to use as a filename.
pub fn sanitize_title(title: &str) -> String {
    title
        .replace(':', " -")
        .replace(['/', '\\'], "-")
}

/// Canonical filename stem for a title and optional year.
pub fn canonical_stem(title: &str, year: Option<u16>) -> String {
    let title = sanitize_title(title.trim());
    match year {
        Some(year) => format!("{title} ({year})"),
        None => title,
    }
}

/// Case-insensitive, whitespace-collapsed form used for identity comparison.
pub fn normalize_title(title: &str) -> String {
    title
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Filename without its final extension.
fn file_stem(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && !ext.contains(' ') => stem,
        _ => name,
    }
}
