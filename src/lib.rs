//! anna-dl - search and download books from Anna's Archive
//!
//! The library is split into a scraping side that turns catalog pages into
//! typed records and a retrieval side that streams a chosen link to disk.
//!
//! # Features
//!
//! - Async/await support via Tokio
//! - Selector fallback chains that survive catalog markup changes
//! - Streaming downloads with progress callbacks and cancellation
//! - Search result caching
//!
//! # Example
//!
//! ```no_run
//! use anna_dl::{config::Config, download::Downloader, scrape::Scraper};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load()?;
//!     let scraper = Scraper::from_config(&config)?;
//!
//!     let books = scraper.search("the rust programming language", 5).await?;
//!     if let Some(book) = books.first() {
//!         let links = scraper.get_links(&book.url).await?;
//!         if let Some(link) = links.first() {
//!             let downloader = Downloader::from_config(&config, None)?;
//!             let path = downloader.download(&link.url, None, None).await?;
//!             println!("Saved to {}", path.display());
//!         }
//!     }
//!     Ok(())
//! }
//! ```

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod progress;

// Feature modules organized by functionality
pub mod cache;
pub mod download;
pub mod http;
pub mod scrape;
pub mod tasks;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use config::Config;
pub use download::Downloader;
pub use error::{AnnaDlError, ErrorKind, Result};
pub use scrape::{Book, DownloadLink, LinkSource, Scraper};
