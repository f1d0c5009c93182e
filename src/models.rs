//! Data models shared across the collection and aggregation pipelines.
//!
//! - [`ArticleRef`]: a candidate article discovered by the collector
//! - [`ArticleRecord`]: a candidate enriched with extracted content, the
//!   unit persisted in daily batch files
//! - [`TopicSummary`] and [`TermCount`]: the ranked frequency summary
//!   computed from one batch
//!
//! Persisted shapes are plain serde derives; batch and summary files are
//! UTF-8 JSON with non-ASCII text left as-is.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A candidate article discovered by the collector.
///
/// The `url` is always absolute: relative homepage links are resolved
/// against the source's origin at creation time. Candidates are transient,
/// consumed by the content extractor in the same run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleRef {
    /// Display name of the source the candidate came from.
    pub source: String,
    /// Article headline as reported by the feed or the page itself.
    pub title: String,
    /// Absolute URL of the article.
    pub url: String,
}

/// A collected article, with whatever content extraction produced.
///
/// `content` is empty when extraction failed; such records are dropped by
/// the collection pipeline before persistence. `collected_at` is always
/// set, success or not.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ArticleRecord {
    pub source: String,
    pub title: String,
    pub url: String,
    /// Extracted body text. Empty means extraction failed.
    pub content: String,
    /// Publication timestamp when the page declared one.
    pub publish_date: Option<DateTime<Utc>>,
    /// When this record was produced.
    pub collected_at: DateTime<Utc>,
}

/// One ranked term with its occurrence count.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct TermCount {
    pub text: String,
    pub count: u64,
}

/// Ranked entity and keyword frequencies derived from one article batch.
///
/// Written twice per analysis run: under a dated name and under the fixed
/// `topics.json` name, which is overwritten every run.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TopicSummary {
    /// Date stamp of the analysis run, `YYYY-MM-DD`.
    pub date: String,
    /// Number of articles in the batch, including failed extractions.
    pub total_articles: usize,
    /// Distinct source names present in the batch, sorted.
    pub sources: Vec<String>,
    pub top_entities: Vec<TermCount>,
    pub top_keywords: Vec<TermCount>,
    pub top_entities_by_source: BTreeMap<String, Vec<TermCount>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_record() -> ArticleRecord {
        ArticleRecord {
            source: "La Repubblica".to_string(),
            title: "Novità dall'economia".to_string(),
            url: "https://www.repubblica.it/economia/articolo".to_string(),
            content: "Il governo ha annunciato più investimenti.".to_string(),
            publish_date: Some(Utc.with_ymd_and_hms(2026, 8, 5, 9, 30, 0).unwrap()),
            collected_at: Utc.with_ymd_and_hms(2026, 8, 6, 7, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_record_round_trip() {
        let record = sample_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: ArticleRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn test_record_json_keeps_non_ascii() {
        let json = serde_json::to_string(&sample_record()).unwrap();
        assert!(json.contains("Novità"));
        assert!(json.contains("più"));
        assert!(!json.contains("\\u"));
    }

    #[test]
    fn test_record_with_failed_extraction_deserializes() {
        let json = r#"{
            "source": "La Stampa",
            "title": "Titolo",
            "url": "https://www.lastampa.it/articolo",
            "content": "",
            "publish_date": null,
            "collected_at": "2026-08-06T07:00:00Z"
        }"#;
        let record: ArticleRecord = serde_json::from_str(json).unwrap();
        assert!(record.content.is_empty());
        assert!(record.publish_date.is_none());
    }

    #[test]
    fn test_summary_serialization_shape() {
        let mut by_source = BTreeMap::new();
        by_source.insert(
            "La Repubblica".to_string(),
            vec![TermCount { text: "Roma".to_string(), count: 3 }],
        );
        let summary = TopicSummary {
            date: "2026-08-06".to_string(),
            total_articles: 12,
            sources: vec!["La Repubblica".to_string(), "La Stampa".to_string()],
            top_entities: vec![TermCount { text: "Roma".to_string(), count: 3 }],
            top_keywords: vec![TermCount { text: "governo".to_string(), count: 7 }],
            top_entities_by_source: by_source,
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"total_articles\":12"));
        assert!(json.contains("\"top_entities\""));
        assert!(json.contains("\"top_entities_by_source\""));

        let back: TopicSummary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, summary);
    }
}
