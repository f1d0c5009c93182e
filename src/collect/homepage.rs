//! Homepage-based collection, for outlets without a usable feed: pull
//! article links off the homepage with the source's CSS selector, then
//! fetch each page once for its title.
//!
//! Relative hrefs are resolved against the homepage origin, so candidates
//! always carry absolute URLs.

use reqwest::Client;
use scraper::{Html, Selector};
use std::error::Error;
use tracing::{debug, warn};
use url::Url;

use super::PER_SOURCE_LIMIT;
use crate::models::ArticleRef;
use crate::rate_limit::RateLimiter;
use crate::sources::Source;
use crate::utils::collapse_whitespace;

/// Fetch the source's homepage and build candidates from its article links.
///
/// The homepage fetch and each per-link title fetch go through the rate
/// limiter. A link whose title cannot be fetched is skipped with a warning;
/// it does not fail the source.
pub(super) async fn fetch(
    client: &Client,
    limiter: &mut RateLimiter,
    source: &Source,
) -> Result<Vec<ArticleRef>, Box<dyn Error>> {
    let selector = source
        .link_selector
        .as_deref()
        .ok_or("source has no link selector")?;
    limiter.acquire(&source.homepage_url).await;
    let html = client
        .get(&source.homepage_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    let base = Url::parse(&source.homepage_url)?;
    let urls = extract_links(&html, selector, &base)?;
    debug!(count = urls.len(), "Extracted homepage links");

    let mut candidates = Vec::new();
    for url in urls {
        limiter.acquire(url.as_str()).await;
        match fetch_title(client, &url).await {
            Ok(title) => candidates.push(ArticleRef {
                source: source.name.clone(),
                title,
                url: url.to_string(),
            }),
            Err(e) => warn!(url = %url, error = %e, "Could not fetch article title; skipping"),
        }
    }
    Ok(candidates)
}

/// Apply a link selector to homepage HTML, resolving hrefs against `base`.
///
/// Caps the result at [`PER_SOURCE_LIMIT`] URLs. An invalid selector is an
/// error (it comes from configuration); an unresolvable href is skipped.
pub fn extract_links(html: &str, selector: &str, base: &Url) -> Result<Vec<Url>, Box<dyn Error>> {
    let link_selector = Selector::parse(selector)
        .map_err(|e| format!("invalid link selector {selector:?}: {e}"))?;
    let document = Html::parse_document(html);

    let mut urls = Vec::new();
    for element in document.select(&link_selector) {
        if urls.len() == PER_SOURCE_LIMIT {
            break;
        }
        let Some(href) = element.value().attr("href") else {
            continue;
        };
        match base.join(href) {
            Ok(resolved) => urls.push(resolved),
            Err(e) => debug!(href, error = %e, "Skipping unresolvable link"),
        }
    }
    Ok(urls)
}

async fn fetch_title(client: &Client, url: &Url) -> Result<String, Box<dyn Error>> {
    let html = client
        .get(url.clone())
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    parse_title(&html).ok_or_else(|| format!("no title found at {url}").into())
}

/// Best-effort title from a page: `og:title`, then `<title>`, then `<h1>`.
pub fn parse_title(html: &str) -> Option<String> {
    let document = Html::parse_document(html);

    let og_title = Selector::parse(r#"meta[property="og:title"]"#).unwrap();
    if let Some(meta) = document.select(&og_title).next() {
        if let Some(content) = meta.value().attr("content") {
            let content = collapse_whitespace(content);
            if !content.is_empty() {
                return Some(content);
            }
        }
    }

    for fallback in ["title", "h1"] {
        let selector = Selector::parse(fallback).unwrap();
        if let Some(element) = document.select(&selector).next() {
            let text = collapse_whitespace(&element.text().collect::<String>());
            if !text.is_empty() {
                return Some(text);
            }
        }
    }
    None
}
