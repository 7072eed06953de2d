//! Page fetching and link/article scraping.
//!
//! Scraping follows a two-phase pattern:
//!
//! 1. **Indexing** ([`index`]): discover article links inside the index
//!    page's container elements
//! 2. **Fetching** ([`article`]): download each article and reduce its
//!    paragraph elements to plain text
//!
//! All network access goes through the [`Fetcher`] trait so the pipeline can
//! run against [`HttpFetcher`] or a test double.

pub mod article;
pub mod index;

use crate::error::{Result, ScrapeError};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Response};
use scraper::Html;
use std::time::Duration;
use tracing::{debug, instrument};

/// Browser-like identification sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 6.1; WOW64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/45.0.2454.85 Safari/537.36";

/// Retrieves the body behind a URL.
pub trait Fetcher {
    /// Raw bytes, for binary payloads such as the model archive.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;

    /// Body decoded to text using the charset the server declared.
    async fn fetch_text(&self, url: &str) -> Result<String>;
}

/// [`Fetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Build a client sending `user_agent`, with an optional connect timeout.
    /// No other timeout or retry policy is applied.
    pub fn new(user_agent: &str, connect_timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(user_agent);
        if let Some(timeout) = connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let client = builder.build().map_err(|e| ScrapeError::Config {
            message: format!("could not build HTTP client: {e}"),
        })?;
        Ok(Self { client })
    }

    /// GET `url`, treating a non-2xx status as a failure.
    async fn get(&self, url: &str) -> Result<Response> {
        self.client
            .get(url)
            .send()
            .await
            .and_then(Response::error_for_status)
            .map_err(|source| ScrapeError::Fetch {
                url: url.to_string(),
                source,
            })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(level = "debug", skip(self))]
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let body = self
            .get(url)
            .await?
            .bytes()
            .await
            .map_err(|source| ScrapeError::Fetch {
                url: url.to_string(),
                source,
            })?;

        debug!(bytes = body.len(), "Fetched body");
        Ok(body.to_vec())
    }

    #[instrument(level = "debug", skip(self))]
    async fn fetch_text(&self, url: &str) -> Result<String> {
        let response = self.get(url).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        // Falls back to UTF-8, replacing invalid sequences, when no usable
        // charset is declared.
        let text = response.text().await.map_err(|source| ScrapeError::Fetch {
            url: url.to_string(),
            source,
        })?;

        debug!(bytes = text.len(), content_type = ?content_type, "Fetched text");
        Ok(text)
    }
}

/// Check decoded markup and parse it into a document.
///
/// HTML parsing itself is error-tolerant; see [`check_markup`] for the one
/// case reported as unparseable.
pub fn parse_document(url: &str, markup: String) -> Result<Html> {
    let markup = check_markup(url, markup)?;
    Ok(Html::parse_document(&markup))
}

/// Drop a leading byte-order mark and reject binary payloads.
///
/// Text containing NUL characters did not come from an HTML page (images,
/// archives, PDFs served under a page URL) and is a [`ScrapeError::Parse`].
pub fn check_markup(url: &str, markup: String) -> Result<String> {
    let markup = match markup.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => markup,
    };
    if let Some(offset) = markup.find('\0') {
        return Err(ScrapeError::Parse {
            url: url.to_string(),
            reason: format!("binary content (NUL at byte {offset})"),
        });
    }
    Ok(markup)
}
