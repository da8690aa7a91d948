//! Per-field metadata extraction from a search result's text block.
//!
//! Each extractor is independent and infallible: when its pattern is absent it
//! returns [`UNKNOWN`] rather than failing the record.

use super::consts;
use super::models::UNKNOWN;

/// Metadata fields of a search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    pub author: String,
    pub year: String,
    pub language: String,
    pub format: String,
    pub size: String,
}

impl Metadata {
    pub fn from_text(text: &str) -> Self {
        Self {
            author: author(text),
            year: year(text),
            language: language(text),
            format: format(text),
            size: size(text),
        }
    }
}

fn or_unknown(value: Option<String>) -> String {
    value
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| UNKNOWN.to_string())
}

/// The text right before a `[xx]` language tag, else the first short name-like line.
///
/// The line heuristic can pick up title fragments when the markup has no clean
/// line break between title and author.
pub fn author(text: &str) -> String {
    let tagged = consts::AUTHOR_BEFORE_LANG
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().lines().last())
        .map(|line| line.trim().to_string());

    or_unknown(tagged.filter(|a| !a.is_empty()).or_else(|| {
        text.lines()
            .map(str::trim)
            .find(|line| {
                !line.is_empty()
                    && line.chars().count() < 50
                    && !line.contains('[')
                    && !line.contains("http")
                    && consts::AUTHOR_LINE.is_match(line)
            })
            .map(str::to_string)
    }))
}

pub fn year(text: &str) -> String {
    or_unknown(consts::YEAR.find(text).map(|m| m.as_str().to_string()))
}

pub fn language(text: &str) -> String {
    or_unknown(
        consts::LANGUAGE
            .captures(text)
            .and_then(|caps| caps.get(2))
            .map(|m| m.as_str().to_string()),
    )
}

pub fn format(text: &str) -> String {
    or_unknown(consts::FORMAT.find(text).map(|m| m.as_str().to_uppercase()))
}

pub fn size(text: &str) -> String {
    or_unknown(consts::SIZE.find(text).map(|m| m.as_str().to_string()))
}
