use futures::StreamExt;
use reqwest::header::{HeaderMap, HeaderName, CONTENT_DISPOSITION, CONTENT_TYPE};
use reqwest::Url;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncWriteExt, BufWriter};
use tokio_util::io::StreamReader;
use tokio_util::sync::CancellationToken;

use super::filename;
use super::reader::ProgressReader;
use crate::config::Config;
use crate::error::{AnnaDlError, DownloadError, HttpError};
use crate::http::HttpClient;

type Result<T> = std::result::Result<T, AnnaDlError>;

/// Progress callback: `(bytes_so_far, total)`, `total` is 0 when unknown
pub type ProgressFn = Box<dyn FnMut(u64, u64) + Send>;

/// Suffixes browsers and download managers use for incomplete files
const PARTIAL_SUFFIXES: [&str; 2] = [".part", ".crdownload"];

/// Streams a single URL into a file in the download directory
#[derive(Debug, Clone)]
pub struct Downloader {
    http: HttpClient,
    download_dir: PathBuf,
}

impl Downloader {
    pub fn new(http: HttpClient, download_dir: impl Into<PathBuf>) -> Self {
        Self {
            http,
            download_dir: download_dir.into(),
        }
    }

    /// Downloader for the configured directory, or `output` when given
    pub fn from_config(config: &Config, output: Option<&Path>) -> Result<Self> {
        let http = HttpClient::from_config(config, Duration::from_secs(config.download.timeout))?;
        Ok(Self::new(http, config.download_dir(output)))
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Download `url` and return the absolute path of the written file.
    ///
    /// `filename` overrides name detection but is still sanitized. On any failure
    /// the partially written file is removed.
    pub async fn download(
        &self,
        url: &str,
        filename: Option<&str>,
        on_progress: Option<ProgressFn>,
    ) -> Result<PathBuf> {
        self.download_with_cancel(url, filename, on_progress, &CancellationToken::new())
            .await
    }

    /// Like [`Downloader::download`], aborting with [`AnnaDlError::Cancelled`]
    /// as soon as `cancel` fires.
    pub async fn download_with_cancel(
        &self,
        url: &str,
        filename: Option<&str>,
        on_progress: Option<ProgressFn>,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        tokio::fs::create_dir_all(&self.download_dir)
            .await
            .map_err(|source| DownloadError::CreateDir {
                path: self.download_dir.clone(),
                source,
            })?;

        let url = Url::parse(url).map_err(|e| HttpError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(AnnaDlError::Cancelled),
            response = self.http.get_url(url.clone()) => response?,
        };

        let dir = tokio::fs::canonicalize(&self.download_dir)
            .await
            .map_err(|source| DownloadError::CreateDir {
                path: self.download_dir.clone(),
                source,
            })?;

        let headers = response.headers();
        let name = filename::resolve(
            filename,
            &url,
            header_str(headers, CONTENT_DISPOSITION).as_deref(),
        );
        let name = filename::ensure_extension(name, header_str(headers, CONTENT_TYPE).as_deref());
        let path = dir.join(&name);
        let total = response.content_length().unwrap_or(0);

        tracing::debug!("Saving {} to {}", url, path.display());

        let file = File::create(&path)
            .await
            .map_err(|source| DownloadError::CreateFile {
                path: path.clone(),
                source,
            })?;

        let body = StreamReader::new(Box::pin(
            response
                .bytes_stream()
                .map(|chunk| chunk.map_err(io::Error::other)),
        ));
        let mut on_progress = on_progress;
        let mut reader = ProgressReader::new(body, total, move |current, total| {
            if let Some(callback) = on_progress.as_mut() {
                callback(current, total);
            }
        });

        let start = Instant::now();
        let written = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = write_body(&mut reader, file) => Some(result),
        };

        match written {
            Some(Ok(0)) => {
                remove_partial(&path).await;
                Err(DownloadError::Empty { path }.into())
            }
            Some(Ok(bytes)) => {
                tracing::info!(
                    "Downloaded {} in {:.1}s: {}",
                    human_bytes::human_bytes(bytes as f64),
                    start.elapsed().as_secs_f64(),
                    path.display()
                );
                Ok(path)
            }
            Some(Err(source)) => {
                remove_partial(&path).await;
                Err(DownloadError::Transfer { path, source }.into())
            }
            None => {
                remove_partial(&path).await;
                tracing::info!("Download cancelled: {}", name);
                Err(AnnaDlError::Cancelled)
            }
        }
    }

    /// Whether a `.part` or `.crdownload` sibling of `filename` exists
    pub fn is_download_in_progress(&self, filename: &str) -> bool {
        PARTIAL_SUFFIXES
            .iter()
            .any(|suffix| self.download_dir.join(format!("{}{}", filename, suffix)).exists())
    }

    /// Remove partial-download artifacts from the download directory
    pub async fn cleanup_partial_downloads(&self) -> Result<usize> {
        let mut entries = match tokio::fs::read_dir(&self.download_dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
            Err(e) => return Err(e.into()),
        };

        let mut cleaned_count = 0;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let is_partial = name
                .to_str()
                .is_some_and(|name| PARTIAL_SUFFIXES.iter().any(|suffix| name.ends_with(suffix)));
            if !is_partial {
                continue;
            }

            match tokio::fs::remove_file(entry.path()).await {
                Ok(_) => {
                    tracing::info!("Cleaned up partial file: {}", entry.path().display());
                    cleaned_count += 1;
                }
                Err(e) => {
                    tracing::warn!("Failed to remove {}: {}", entry.path().display(), e);
                }
            }
        }

        Ok(cleaned_count)
    }
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

/// Copy the whole body into `file`, returning the byte count
async fn write_body<R: AsyncRead + Unpin>(reader: &mut R, file: File) -> io::Result<u64> {
    let mut writer = BufWriter::new(file);
    let written = tokio::io::copy(reader, &mut writer).await?;
    writer.flush().await?;
    writer.shutdown().await?;
    Ok(written)
}

async fn remove_partial(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!("Failed to remove partial file {}: {}", path.display(), e);
        }
    }
}
