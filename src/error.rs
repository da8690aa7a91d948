//! Domain-specific error types for anna-dl
//!
//! This module provides structured error handling with proper error chains
//! and context preservation. Every error maps onto a small [`ErrorKind`]
//! taxonomy so front ends can show a short message and offer one recovery action.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for the anna-dl application
#[derive(Error, Debug)]
pub enum AnnaDlError {
    #[error("HTTP error: {0}")]
    Http(#[from] HttpError),

    #[error("Scrape error: {0}")]
    Scrape(#[from] ScrapeError),

    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Operation cancelled")]
    Cancelled,
}

/// Transport-level errors
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("Failed to read response body from {url}: {source}")]
    Body {
        url: String,
        source: reqwest::Error,
    },
}

/// Page parsing and result errors
#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Failed to parse page {url}: {reason}")]
    Parse { url: String, reason: String },

    #[error("No results found for \"{query}\"")]
    NoResults { query: String },

    #[error("No download links found on {url}")]
    NoLinks { url: String },
}

/// Download operation errors
#[derive(Error, Debug)]
pub enum DownloadError {
    #[error("Failed to create download directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create file {path}: {source}")]
    CreateFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Transfer failed for {path}: {source}")]
    Transfer {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Downloaded file is empty: {path}")]
    Empty { path: PathBuf },
}

/// Configuration validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration: {field}: {reason}")]
    Invalid { field: String, reason: String },

    #[error("Invalid path: {path}: {reason}")]
    InvalidPath { path: PathBuf, reason: String },
}

/// Coarse classification of every failure the pipeline can report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Request,
    Network,
    Parse,
    EmptyResult,
    EmptyDownload,
    FileSystem,
    Transfer,
    Cancelled,
    Config,
}

/// The single recovery action a front end offers for an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recovery {
    Retry,
    BackToSearch,
}

impl ErrorKind {
    /// Short, user-facing description
    pub fn message(self) -> &'static str {
        match self {
            ErrorKind::Request => "Could not build the request",
            ErrorKind::Network => "The server could not be reached",
            ErrorKind::Parse => "The page could not be read",
            ErrorKind::EmptyResult => "Nothing found",
            ErrorKind::EmptyDownload => "The server sent an empty file",
            ErrorKind::FileSystem => "Could not write to the download directory",
            ErrorKind::Transfer => "The download was interrupted",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::Config => "Invalid configuration",
        }
    }

    pub fn recovery(self) -> Recovery {
        match self {
            ErrorKind::Network | ErrorKind::Transfer | ErrorKind::FileSystem => Recovery::Retry,
            ErrorKind::Request
            | ErrorKind::Parse
            | ErrorKind::EmptyResult
            | ErrorKind::EmptyDownload
            | ErrorKind::Cancelled
            | ErrorKind::Config => Recovery::BackToSearch,
        }
    }
}

impl AnnaDlError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AnnaDlError::Http(HttpError::InvalidUrl { .. } | HttpError::Client(_)) => {
                ErrorKind::Request
            }
            AnnaDlError::Http(_) => ErrorKind::Network,
            AnnaDlError::Scrape(ScrapeError::Parse { .. }) => ErrorKind::Parse,
            AnnaDlError::Scrape(_) => ErrorKind::EmptyResult,
            AnnaDlError::Download(DownloadError::Empty { .. }) => ErrorKind::EmptyDownload,
            AnnaDlError::Download(DownloadError::Transfer { .. }) => ErrorKind::Transfer,
            AnnaDlError::Download(_) | AnnaDlError::Io(_) => ErrorKind::FileSystem,
            AnnaDlError::Config(_) => ErrorKind::Config,
            AnnaDlError::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Result type alias using AnnaDlError
pub type Result<T> = std::result::Result<T, AnnaDlError>;

/// Helper trait for adding context to errors
pub trait ErrorContext<T> {
    fn context(self, msg: impl Into<String>) -> Result<T>;
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<AnnaDlError>,
{
    fn context(self, msg: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let error: AnnaDlError = e.into();
            // Log the context
            tracing::error!("{}: {}", msg.into(), error);
            error
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let error: AnnaDlError = e.into();
            tracing::error!("{}: {}", f(), error);
            error
        })
    }
}
