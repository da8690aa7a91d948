//! On-disk search result cache
//!
//! One JSON file mapping each query to its results, the result limit they
//! were fetched with and the time they were fetched. Entries older than
//! [`CACHE_TTL`] are ignored.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::error::{ConfigError, ErrorContext, Result};
use crate::scrape::Book;

pub const CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

const CACHE_FILE: &str = "search_cache.json";

#[derive(Debug, Default, Serialize, Deserialize)]
struct CacheFile {
    entries: HashMap<String, Entry>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Entry {
    timestamp: u64,
    /// Result limit of the search that produced `books`; 0 when unknown
    #[serde(default)]
    max_results: usize,
    books: Vec<Book>,
}

impl Entry {
    /// Fewer books than were asked for means the search had no more to give
    fn is_complete(&self) -> bool {
        self.books.len() < self.max_results
    }

    fn covers(&self, max_results: usize) -> bool {
        self.books.len() >= max_results || self.is_complete()
    }
}

#[derive(Debug, Clone)]
pub struct SearchCache {
    path: PathBuf,
}

fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

impl SearchCache {
    /// Cache under the platform cache directory
    pub fn new() -> Result<Self> {
        let cache_dir = dirs::cache_dir()
            .ok_or_else(|| ConfigError::Invalid {
                field: "cache_dir".to_string(),
                reason: "Could not determine cache directory".to_string(),
            })?
            .join("anna-dl");
        Self::at_path(&cache_dir)
    }

    pub fn at_path(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir).context("Failed to create cache directory")?;
        Ok(Self {
            path: cache_dir.join(CACHE_FILE),
        })
    }

    fn read(&self) -> Result<CacheFile> {
        if !self.path.exists() {
            return Ok(CacheFile::default());
        }
        let content = std::fs::read_to_string(&self.path).context("Failed to read search cache")?;
        match serde_json::from_str(&content) {
            Ok(file) => Ok(file),
            Err(e) => {
                tracing::warn!("Discarding unreadable search cache: {}", e);
                Ok(CacheFile::default())
            }
        }
    }

    /// Up to `max_results` cached results for `query`
    ///
    /// Missing and expired entries are misses, and so is an entry that was cut
    /// off below `max_results` by a smaller limit.
    pub fn get(&self, query: &str, max_results: usize) -> Result<Option<Vec<Book>>> {
        let mut file = self.read()?;
        let Some(entry) = file.entries.remove(query) else {
            return Ok(None);
        };

        if now_secs().saturating_sub(entry.timestamp) > CACHE_TTL.as_secs() {
            tracing::debug!("Cached results for {:?} expired", query);
            return Ok(None);
        }
        if !entry.covers(max_results) {
            tracing::debug!(
                "Cached results for {:?} hold {} of {} requested",
                query,
                entry.books.len(),
                max_results
            );
            return Ok(None);
        }
        Ok(Some(entry.books.into_iter().take(max_results).collect()))
    }

    /// Store `books`, the outcome of a search limited to `max_results`
    pub fn set(&self, query: &str, books: &[Book], max_results: usize) -> Result<()> {
        self.set_at(query, books, max_results, now_secs())
    }

    fn set_at(&self, query: &str, books: &[Book], max_results: usize, timestamp: u64) -> Result<()> {
        let mut file = self.read()?;
        file.entries.insert(
            query.to_string(),
            Entry {
                timestamp,
                max_results,
                books: books.to_vec(),
            },
        );

        let content = serde_json::to_string(&file)
            .map_err(std::io::Error::from)
            .context("Failed to serialize search cache")?;
        std::fs::write(&self.path, content).context("Failed to write search cache")
    }
}

/// Serve `query` from `cache` when it can, otherwise run `fetch`
///
/// Cache failures are logged and never fail the search. Empty results are not
/// stored, so a page that matched nothing is fetched again next time.
pub async fn search_cached<F, Fut>(
    cache: Option<&SearchCache>,
    query: &str,
    max_results: usize,
    fetch: F,
) -> Result<Vec<Book>>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<Book>>>,
{
    if let Some(cache) = cache {
        match cache.get(query, max_results) {
            Ok(Some(books)) => {
                tracing::debug!("Using cached results for {:?}", query);
                return Ok(books);
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Failed to read search cache: {}", e),
        }
    }

    let books = fetch().await?;

    if let Some(cache) = cache {
        if books.is_empty() {
            tracing::debug!("Not caching empty results for {:?}", query);
        } else if let Err(e) = cache.set(query, &books, max_results) {
            tracing::warn!("Failed to cache search results: {}", e);
        }
    }
    Ok(books)
}
