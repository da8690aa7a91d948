//! Background task dispatch
//!
//! Each operation runs on its own tokio task and reports back over an unbounded
//! channel, so a front end can keep drawing while requests are in flight.

use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::download::{Downloader, ProgressFn};
use crate::error::{AnnaDlError, Result};
use crate::scrape::{Book, DownloadLink, Scraper};

/// Messages delivered to the front end
#[derive(Debug)]
pub enum Message {
    SearchResult(Result<Vec<Book>>),
    LinkResult(Result<Vec<DownloadLink>>),
    Progress { current: u64, total: u64 },
    Complete(Result<PathBuf>),
}

pub fn spawn_search(
    scraper: Arc<Scraper>,
    query: String,
    max_results: usize,
    tx: UnboundedSender<Message>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AnnaDlError::Cancelled),
            result = scraper.search(&query, max_results) => result,
        };
        let _ = tx.send(Message::SearchResult(result));
    })
}

pub fn spawn_links(
    scraper: Arc<Scraper>,
    book_url: String,
    tx: UnboundedSender<Message>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AnnaDlError::Cancelled),
            result = scraper.get_links(&book_url) => result,
        };
        let _ = tx.send(Message::LinkResult(result));
    })
}

/// Download `url`, emitting `Progress` per chunk and a final `Complete`
pub fn spawn_download(
    downloader: Downloader,
    url: String,
    filename: Option<String>,
    tx: UnboundedSender<Message>,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let progress_tx = tx.clone();
        let on_progress: ProgressFn = Box::new(move |current: u64, total: u64| {
            let _ = progress_tx.send(Message::Progress { current, total });
        });

        let result = downloader
            .download_with_cancel(&url, filename.as_deref(), Some(on_progress), &cancel)
            .await;
        let _ = tx.send(Message::Complete(result));
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::http::HttpClient;
    use crate::test_support::{self, SEARCH_PAGE};
    use axum::response::Html;
    use axum::routing::get;
    use axum::Router;
    use tempfile::TempDir;
    use tokio::sync::mpsc;

    async fn server() -> String {
        let app = Router::new()
            .route("/search", get(|| async { Html(SEARCH_PAGE) }))
            .route("/files/book.epub", get(|| async { vec![7u8; 4096] }));
        test_support::serve(app).await
    }

    #[tokio::test]
    async fn test_search_task_reports_result() {
        let base = server().await;
        let scraper = Arc::new(Scraper::new(HttpClient::builder().build().unwrap(), base));
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_search(scraper, "test".to_string(), 1, tx, CancellationToken::new())
            .await
            .unwrap();

        match rx.recv().await {
            Some(Message::SearchResult(Ok(books))) => {
                assert_eq!(books.len(), 1);
                assert_eq!(books[0].title, "Test Book Title");
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_cancelled_links_task() {
        let base = server().await;
        let scraper = Arc::new(Scraper::new(HttpClient::builder().build().unwrap(), base.clone()));
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        cancel.cancel();

        spawn_links(scraper, format!("{}/md5/123456", base), tx, cancel)
            .await
            .unwrap();

        match rx.recv().await {
            Some(Message::LinkResult(Err(err))) => assert_eq!(err.kind(), ErrorKind::Cancelled),
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_download_task_streams_progress_then_completes() {
        let base = server().await;
        let dir = TempDir::new().unwrap();
        let downloader = Downloader::new(HttpClient::builder().build().unwrap(), dir.path());
        let (tx, mut rx) = mpsc::unbounded_channel();

        spawn_download(
            downloader,
            format!("{}/files/book.epub", base),
            None,
            tx,
            CancellationToken::new(),
        )
        .await
        .unwrap();

        let mut last_progress = None;
        let mut completed = None;
        while let Some(message) = rx.recv().await {
            match message {
                Message::Progress { current, total } => last_progress = Some((current, total)),
                Message::Complete(result) => completed = Some(result),
                other => panic!("unexpected message: {:?}", other),
            }
        }

        assert_eq!(last_progress, Some((4096, 4096)));
        let path = completed.unwrap().unwrap();
        assert_eq!(path.file_name().unwrap(), "book.epub");
    }
}
