//! Index page link discovery.
//!
//! Article links live in anchors nested inside "widget" container elements
//! of the index page. Containers without a usable anchor are skipped, never
//! fatal.

use crate::error::Result;
use crate::models::Link;
use crate::scrapers::{Fetcher, parse_document};
use itertools::Itertools;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use tracing::{debug, info, instrument, warn};
use url::Url;

static ANCHOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());

/// Collect the distinct article links inside every container matched by
/// `container`, resolved against `base_url`.
///
/// Links keep the order they were first seen in, though nothing downstream
/// depends on it.
pub fn discover_links(document: &Html, container: &Selector, base_url: &Url) -> Vec<Link> {
    let mut containers = 0usize;
    let mut links = Vec::new();

    for (index, element) in document.select(container).enumerate() {
        containers += 1;
        let before = links.len();

        for anchor in element.select(&ANCHOR) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            match base_url.join(href.trim()) {
                Ok(resolved) => links.push(resolved.to_string()),
                Err(e) => debug!(container = index, href, error = %e, "Skipping unresolvable href"),
            }
        }

        if links.len() == before {
            debug!(container = index, "Skipping container without a link");
        }
    }

    if containers == 0 {
        warn!("Link container selector matched no elements");
    }

    let links: Vec<Link> = links.into_iter().unique().collect();
    info!(containers, count = links.len(), "Discovered article links");
    debug!(urls = ?links, "Article links");
    links
}

/// Fetch the index page and discover its article links.
///
/// A failure to fetch or decode the index page is returned to the caller:
/// with no index there is nothing to process.
#[instrument(level = "info", skip_all, fields(url = %index_url))]
pub async fn index_articles(
    fetcher: &impl Fetcher,
    index_url: &Url,
    container: &Selector,
) -> Result<Vec<Link>> {
    let markup = fetcher.fetch_text(index_url.as_str()).await?;
    let document = parse_document(index_url.as_str(), markup)?;
    Ok(discover_links(&document, container, index_url))
}
