//! Article fetching and text extraction.

use crate::error::Result;
use crate::models::{Article, Link};
use crate::scrapers::{Fetcher, check_markup};
use crate::text::strip::strip_fragments;
use crate::utils::truncate_for_log;
use scraper::{Html, Selector};
use tracing::{debug, instrument, warn};

/// Fetch one article and decode it into an [`Article`] record, honoring
/// the charset its server declares.
#[instrument(level = "info", skip_all, fields(%url))]
pub async fn fetch_article(fetcher: &impl Fetcher, url: &Link) -> Result<Article> {
    let raw_markup = check_markup(url, fetcher.fetch_text(url).await?)?;
    debug!(bytes = raw_markup.len(), "Fetched article");
    Ok(Article {
        url: url.clone(),
        raw_markup,
    })
}

/// Reduce every element matched by `text_selector` to plain text and join
/// the results in document order.
pub fn extract_text(article: &Article, text_selector: &Selector) -> String {
    let document = Html::parse_document(&article.raw_markup);
    let fragments: Vec<String> = document
        .select(text_selector)
        .map(|element| element.html())
        .collect();

    if fragments.is_empty() {
        warn!(url = %article.url, "Article text selector matched no elements");
    }

    let text = strip_fragments(&fragments);
    debug!(
        url = %article.url,
        elements = fragments.len(),
        preview = %truncate_for_log(&text, 120),
        "Extracted article text"
    );
    text
}
