use serde::{Deserialize, Serialize};
use std::fmt;

/// Sentinel for metadata that could not be extracted
pub const UNKNOWN: &str = "Unknown";

/// A single search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub title: String,
    pub author: String,
    pub year: String,
    pub language: String,
    pub format: String,
    pub size: String,
    /// Absolute URL of the detail page
    pub url: String,
}

impl Book {
    /// Suggested file name for a download of this book: `"{title} - {author}.{format}"`.
    ///
    /// The title is cut to 50 characters and slashes are replaced; the downloader
    /// sanitizes the rest.
    pub fn suggested_filename(&self) -> String {
        let title: String = self.title.chars().take(50).collect();
        format!(
            "{} - {}.{}",
            title.replace('/', "_"),
            self.author.replace('/', "_"),
            self.format.to_lowercase()
        )
    }
}

/// Where a download link points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkSource {
    LibGen,
    AnnasArchive,
    Mirror,
    Unknown,
}

impl LinkSource {
    /// Classify by URL substring, in fixed precedence order.
    pub fn classify(url: &str) -> Self {
        if url.contains("libgen") {
            LinkSource::LibGen
        } else if url.contains("annas") {
            LinkSource::AnnasArchive
        } else if url.contains("mirror") {
            LinkSource::Mirror
        } else {
            LinkSource::Unknown
        }
    }
}

impl fmt::Display for LinkSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LinkSource::LibGen => "LibGen",
            LinkSource::AnnasArchive => "Anna's Archive",
            LinkSource::Mirror => "Mirror",
            LinkSource::Unknown => UNKNOWN,
        };
        f.write_str(name)
    }
}

/// A download option found on a detail page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub text: String,
    pub url: String,
    pub source: LinkSource,
}

impl DownloadLink {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        let url = url.into();
        Self {
            text: text.into(),
            source: LinkSource::classify(&url),
            url,
        }
    }

    pub fn is_reliable(&self) -> bool {
        self.source == LinkSource::LibGen && self.text.to_lowercase().contains("libgen")
    }
}
