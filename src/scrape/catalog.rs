use reqwest::Url;
use scraper::{ElementRef, Html};
use std::time::Duration;
use tracing::instrument;

use super::chain::SelectorChain;
use super::consts;
use super::metadata::Metadata;
use super::models::{Book, DownloadLink};
use crate::config::Config;
use crate::error::{AnnaDlError, HttpError, ScrapeError};
use crate::http::HttpClient;

type Result<T> = std::result::Result<T, AnnaDlError>;

/// Default catalog origin
pub const DEFAULT_BASE_URL: &str = "https://annas-archive.org";

/// Search and detail page scraper
pub struct Scraper {
    http: HttpClient,
    base_url: String,
    results: SelectorChain<Book>,
    links: SelectorChain<DownloadLink>,
}

impl Scraper {
    /// Create a scraper resolving result links against `base_url`
    pub fn new(http: HttpClient, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            results: result_chain(&base_url),
            links: link_chain(),
            http,
            base_url,
        }
    }

    /// Build a scraper with its own client from the `[search]` config section
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = HttpClient::from_config(config, Duration::from_secs(config.search.timeout))?;
        Ok(Self::new(http, config.search.base_url.clone()))
    }

    /// `{base_url}/search?q={query}`
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let raw = format!("{}/search", self.base_url);
        let mut url = Url::parse(&raw).map_err(|e| HttpError::InvalidUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut().append_pair("q", query);
        Ok(url)
    }

    /// Search the catalog, returning at most `max_results` books.
    ///
    /// A page where no result selector matches yields an empty list, not an error.
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<Book>> {
        let url = self.search_url(query)?;
        let html = self.fetch_html(url).await?;
        let books = self.parse_search_results(&html, max_results);
        tracing::debug!("Found {} results for {:?}", books.len(), query);
        Ok(books)
    }

    /// Fetch a book's detail page and collect its download links.
    ///
    /// `book_url` is requested as-is, it is not resolved against the base URL.
    #[instrument(skip(self))]
    pub async fn get_links(&self, book_url: &str) -> Result<Vec<DownloadLink>> {
        let url = Url::parse(book_url).map_err(|e| HttpError::InvalidUrl {
            url: book_url.to_string(),
            reason: e.to_string(),
        })?;
        let html = self.fetch_html(url).await?;
        let links = self.parse_download_links(&html);
        tracing::debug!("Found {} download links", links.len());
        Ok(links)
    }

    pub fn parse_search_results(&self, html: &str, max_results: usize) -> Vec<Book> {
        let document = Html::parse_document(html);
        self.results.first_match(&document, max_results)
    }

    pub fn parse_download_links(&self, html: &str) -> Vec<DownloadLink> {
        let document = Html::parse_document(html);
        self.links.first_match(&document, usize::MAX)
    }

    async fn fetch_html(&self, url: Url) -> Result<String> {
        let response = self.http.get_url(url.clone()).await?;
        let body = response.bytes().await.map_err(|source| HttpError::Body {
            url: url.to_string(),
            source,
        })?;

        String::from_utf8(body.to_vec()).map_err(|e| {
            ScrapeError::Parse {
                url: url.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }
}

fn result_chain(base_url: &str) -> SelectorChain<Book> {
    SelectorChain::new()
        .rule("vim-focus", &consts::RESULT_VIM_FOCUS, book_rule(base_url))
        .rule("md5-href", &consts::RESULT_MD5_HREF, book_rule(base_url))
        .rule("book-title", &consts::RESULT_BOOK_TITLE, book_rule(base_url))
}

fn book_rule(base_url: &str) -> impl Fn(ElementRef<'_>) -> Option<Book> + Send + Sync + 'static {
    let base_url = base_url.to_string();
    move |anchor| book_from_anchor(anchor, &base_url)
}

fn link_chain() -> SelectorChain<DownloadLink> {
    SelectorChain::new()
        .rule("external-downloads-id", &consts::LINKS_EXTERNAL_ID, link_from_anchor)
        .rule("external-downloads-class", &consts::LINKS_EXTERNAL_CLASS, link_from_anchor)
        .rule("downloads-section", &consts::LINKS_DATA_SECTION, link_from_anchor)
        .rule("anywhere", &consts::LINKS_ANYWHERE, link_from_anchor)
}

fn book_from_anchor(anchor: ElementRef<'_>, base_url: &str) -> Option<Book> {
    let title = anchor.text().collect::<String>().trim().to_string();
    if title.is_empty() {
        return None;
    }

    let href = anchor.value().attr("href")?;
    if !href.starts_with('/') {
        return None;
    }

    let Metadata {
        author,
        year,
        language,
        format,
        size,
    } = Metadata::from_text(&context_text(anchor));

    Some(Book {
        title,
        author,
        year,
        language,
        format,
        size,
        url: format!("{}{}", base_url, href),
    })
}

/// Full text of the nearest enclosing `div`, falling back to the parent element
fn context_text(anchor: ElementRef<'_>) -> String {
    anchor
        .ancestors()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "div")
        .or_else(|| anchor.parent().and_then(ElementRef::wrap))
        .map(|element| element.text().collect::<String>())
        .unwrap_or_default()
}

fn link_from_anchor(anchor: ElementRef<'_>) -> Option<DownloadLink> {
    let href = anchor.value().attr("href")?;
    let text = anchor.text().collect::<String>().trim().to_string();
    if text.is_empty() {
        return None;
    }
    Some(DownloadLink::new(text, href))
}
