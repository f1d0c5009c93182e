//! Feed-based collection: fetch an outlet's RSS feed and read candidate
//! articles off its item list.

use quick_xml::de::from_str;
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use tracing::debug;

use super::PER_SOURCE_LIMIT;
use crate::models::ArticleRef;
use crate::rate_limit::RateLimiter;
use crate::sources::Source;

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
}

/// Fetch the source's feed and parse its items into candidates.
pub(super) async fn fetch(
    client: &Client,
    limiter: &mut RateLimiter,
    source: &Source,
) -> Result<Vec<ArticleRef>, Box<dyn Error>> {
    let feed_url = source
        .feed_url
        .as_deref()
        .ok_or("source has no feed URL")?;
    limiter.acquire(feed_url).await;
    let xml = client
        .get(feed_url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?;
    debug!(bytes = xml.len(), "Fetched feed document");
    parse_feed(&xml, &source.name)
}

/// Parse an RSS document into candidates.
///
/// Takes at most the first [`PER_SOURCE_LIMIT`] items; items missing a
/// title or a link are skipped. A document that is not valid RSS is an
/// error for the whole source.
pub fn parse_feed(xml: &str, source_name: &str) -> Result<Vec<ArticleRef>, Box<dyn Error>> {
    let rss: Rss = from_str(xml)?;
    let mut candidates = Vec::new();
    for item in rss.channel.items.into_iter().take(PER_SOURCE_LIMIT) {
        let (Some(title), Some(link)) = (item.title, item.link) else {
            continue;
        };
        let title = title.trim().to_string();
        let link = link.trim().to_string();
        if title.is_empty() || link.is_empty() {
            continue;
        }
        candidates.push(ArticleRef {
            source: source_name.to_string(),
            title,
            url: link,
        });
    }
    Ok(candidates)
}
