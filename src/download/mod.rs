//! File retrieval
//!
//! Streams a download link to disk with filename detection, progress
//! reporting and cancellation. A failed or cancelled download never leaves a
//! partial file behind.

mod downloader;
pub mod filename;
mod reader;

pub use downloader::{Downloader, ProgressFn};
pub use reader::ProgressReader;
