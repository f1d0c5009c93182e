//! Full-text extraction for candidate articles.
//!
//! Downloads each candidate's page and pulls out the body text and, when
//! the page declares one, the publication timestamp. Extraction failures
//! are expected in the wild (paywalls, layout drift, transient network
//! errors) and are absorbed here: [`extract`] always returns an
//! [`ArticleRecord`], carrying empty content when things went wrong, with
//! the failure reason kept only for the log. Dropping the empty records
//! before persistence is the caller's job.
//!
//! Publication timestamps are looked for in three places, in order: the
//! `article:published_time` meta tag, a `<time datetime="…">` element, and
//! a `datePublished` field inside embedded JSON-LD.

use chrono::{DateTime, NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use std::error::Error;
use tracing::{info, instrument, warn};

use crate::models::{ArticleRecord, ArticleRef};
use crate::rate_limit::RateLimiter;
use crate::utils::collapse_whitespace;

/// What one extraction attempt produced, before it is flattened into the
/// persisted record shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Extracted {
        text: String,
        published: Option<DateTime<Utc>>,
    },
    Failed {
        reason: String,
    },
}

/// Download and extract one candidate, always producing a record.
///
/// The request goes through the rate limiter. On any failure the record
/// comes back with empty content and no publish date; `collected_at` is
/// set either way.
#[instrument(level = "info", skip_all, fields(url = %candidate.url))]
pub async fn extract(
    client: &Client,
    limiter: &mut RateLimiter,
    candidate: ArticleRef,
) -> ArticleRecord {
    limiter.acquire(&candidate.url).await;
    let extraction = match download(client, &candidate.url).await {
        Ok(html) => parse_article(&html),
        Err(e) => Extraction::Failed {
            reason: e.to_string(),
        },
    };
    if let Extraction::Failed { reason } = &extraction {
        warn!(url = %candidate.url, %reason, "Content extraction failed");
    }
    into_record(candidate, extraction)
}

/// Extract every candidate in order, one request at a time.
///
/// Candidate lists routinely interleave domains, so ordering is not
/// batched per domain; the rate limiter alone enforces the spacing.
#[instrument(level = "info", skip_all)]
pub async fn extract_all(
    client: &Client,
    limiter: &mut RateLimiter,
    candidates: Vec<ArticleRef>,
) -> Vec<ArticleRecord> {
    info!(count = candidates.len(), "Extracting article contents");
    let mut records = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        records.push(extract(client, limiter, candidate).await);
    }
    let with_content = records.iter().filter(|r| !r.content.is_empty()).count();
    info!(
        total = records.len(),
        with_content,
        "Extraction finished"
    );
    records
}

async fn download(client: &Client, url: &str) -> Result<String, Box<dyn Error>> {
    Ok(client
        .get(url)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await?)
}

/// Pull body text and publish date out of an article page.
pub fn parse_article(html: &str) -> Extraction {
    let document = Html::parse_document(html);
    let text = article_text(&document);
    if text.is_empty() {
        return Extraction::Failed {
            reason: "no article body found".to_string(),
        };
    }
    Extraction::Extracted {
        published: publish_date(&document, html),
        text,
    }
}

/// Flatten an extraction into the persisted record shape.
///
/// This is the single place where a failure becomes an empty content
/// string. The record is stamped here, so `collected_at` is set for
/// successes and failures alike.
pub fn into_record(candidate: ArticleRef, extraction: Extraction) -> ArticleRecord {
    let (content, publish_date) = match extraction {
        Extraction::Extracted { text, published } => (text, published),
        Extraction::Failed { .. } => (String::new(), None),
    };
    ArticleRecord {
        source: candidate.source,
        title: candidate.title,
        url: candidate.url,
        content,
        publish_date,
        collected_at: Utc::now(),
    }
}

fn article_text(document: &Html) -> String {
    // paragraphs inside an <article> when the page has one, any paragraph otherwise
    let article_paragraphs = Selector::parse("article p").unwrap();
    let any_paragraph = Selector::parse("p").unwrap();

    let mut paragraphs: Vec<String> = document
        .select(&article_paragraphs)
        .map(paragraph_text)
        .filter(|p| !p.is_empty())
        .collect();
    if paragraphs.is_empty() {
        paragraphs = document
            .select(&any_paragraph)
            .map(paragraph_text)
            .filter(|p| !p.is_empty())
            .collect();
    }
    paragraphs.join("\n")
}

fn paragraph_text(element: ElementRef) -> String {
    collapse_whitespace(&element.text().collect::<String>())
}

static DATE_PUBLISHED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""datePublished"\s*:\s*"([^"]+)""#).unwrap());

fn publish_date(document: &Html, raw_html: &str) -> Option<DateTime<Utc>> {
    let meta = Selector::parse(r#"meta[property="article:published_time"]"#).unwrap();
    if let Some(element) = document.select(&meta).next() {
        if let Some(stamp) = element.value().attr("content").and_then(parse_timestamp) {
            return Some(stamp);
        }
    }

    let time = Selector::parse("time[datetime]").unwrap();
    if let Some(element) = document.select(&time).next() {
        if let Some(stamp) = element.value().attr("datetime").and_then(parse_timestamp) {
            return Some(stamp);
        }
    }

    DATE_PUBLISHED
        .captures(raw_html)
        .and_then(|captures| parse_timestamp(captures.get(1)?.as_str()))
}

/// Parse the timestamp formats news pages actually use.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(stamp) = DateTime::parse_from_rfc3339(raw) {
        return Some(stamp.with_timezone(&Utc));
    }
    if let Ok(stamp) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(stamp.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|datetime| datetime.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate() -> ArticleRef {
        ArticleRef {
            source: "Prova".to_string(),
            title: "Titolo".to_string(),
            url: "https://news.example/articolo".to_string(),
        }
    }

    #[test]
    fn test_parse_article_prefers_article_element() {
        let html = r#"<html><body>
            <p>Menu e navigazione</p>
            <article><p>Primo  paragrafo.</p><p>Secondo paragrafo.</p></article>
          </body></html>"#;
        match parse_article(html) {
            Extraction::Extracted { text, .. } => {
                assert_eq!(text, "Primo paragrafo.\nSecondo paragrafo.");
            }
            Extraction::Failed { reason } => panic!("extraction failed: {reason}"),
        }
    }

    #[test]
    fn test_parse_article_falls_back_to_paragraphs() {
        let html = "<html><body><div><p>Corpo senza tag article.</p></div></body></html>";
        match parse_article(html) {
            Extraction::Extracted { text, .. } => assert_eq!(text, "Corpo senza tag article."),
            Extraction::Failed { reason } => panic!("extraction failed: {reason}"),
        }
    }

    #[test]
    fn test_parse_article_without_body_fails() {
        let html = "<html><body><div>solo div</div></body></html>";
        assert!(matches!(parse_article(html), Extraction::Failed { .. }));
    }

    #[test]
    fn test_publish_date_from_meta_tag() {
        let html = r#"<html><head>
            <meta property="article:published_time" content="2026-08-05T09:30:00+02:00" />
          </head><body><article><p>Testo.</p></article></body></html>"#;
        match parse_article(html) {
            Extraction::Extracted { published, .. } => {
                let stamp = published.expect("missing publish date");
                assert_eq!(stamp.to_rfc3339(), "2026-08-05T07:30:00+00:00");
            }
            Extraction::Failed { reason } => panic!("extraction failed: {reason}"),
        }
    }

    #[test]
    fn test_publish_date_from_time_element() {
        let html = r#"<html><body>
            <article><time datetime="2026-08-05T06:00:00Z">5 agosto</time><p>Testo.</p></article>
          </body></html>"#;
        match parse_article(html) {
            Extraction::Extracted { published, .. } => assert!(published.is_some()),
            Extraction::Failed { reason } => panic!("extraction failed: {reason}"),
        }
    }

    #[test]
    fn test_publish_date_from_json_ld() {
        let html = r#"<html><head>
            <script type="application/ld+json">{"@type":"NewsArticle","datePublished":"2026-08-04T18:00:00+00:00"}</script>
          </head><body><p>Testo.</p></body></html>"#;
        match parse_article(html) {
            Extraction::Extracted { published, .. } => assert!(published.is_some()),
            Extraction::Failed { reason } => panic!("extraction failed: {reason}"),
        }
    }

    #[test]
    fn test_parse_timestamp_variants() {
        assert!(parse_timestamp("2026-08-05T09:30:00+02:00").is_some());
        assert!(parse_timestamp("2026-08-05T09:30:00+0200").is_some());
        assert!(parse_timestamp("2026-08-05").is_some());
        assert!(parse_timestamp("ieri").is_none());
        assert!(parse_timestamp("").is_none());
    }

    #[test]
    fn test_into_record_success_keeps_content() {
        let record = into_record(
            candidate(),
            Extraction::Extracted {
                text: "Corpo.".to_string(),
                published: None,
            },
        );
        assert_eq!(record.content, "Corpo.");
        assert_eq!(record.source, "Prova");
    }

    #[tokio::test]
    async fn test_extract_always_returns_a_record() {
        // nothing listens on port 1; the download fails, the record does not
        let client = reqwest::Client::new();
        let mut limiter = RateLimiter::with_interval(std::time::Duration::from_millis(1));
        let before = Utc::now();

        let mut candidate = candidate();
        candidate.url = "http://127.0.0.1:1/articolo".to_string();
        let record = extract(&client, &mut limiter, candidate).await;

        assert!(record.content.is_empty());
        assert!(record.publish_date.is_none());
        assert!(record.collected_at >= before);
        assert_eq!(record.source, "Prova");
    }

    #[test]
    fn test_into_record_failure_is_empty_but_stamped() {
        let before = Utc::now();
        let record = into_record(
            candidate(),
            Extraction::Failed {
                reason: "timeout".to_string(),
            },
        );
        assert!(record.content.is_empty());
        assert!(record.publish_date.is_none());
        assert!(record.collected_at >= before);
        assert_eq!(record.title, "Titolo");
    }
}
