//! Catalog scraping
//!
//! Turns Anna's Archive search and detail pages into [`Book`] and
//! [`DownloadLink`] records. Element lookup goes through [`SelectorChain`]s so
//! that layout changes degrade to a fallback selector instead of an error.

mod catalog;
mod chain;
mod consts;
pub mod metadata;
mod models;

pub use catalog::{Scraper, DEFAULT_BASE_URL};
pub use chain::SelectorChain;
pub use metadata::Metadata;
pub use models::{Book, DownloadLink, LinkSource, UNKNOWN};
