//! Frequency aggregation over one article batch.
//!
//! For every article with body text, the annotator supplies entity spans
//! and tokens; this module tallies them into global and per-source
//! counters and assembles the ranked [`TopicSummary`].
//!
//! Filtering rules:
//!
//! - entities: only person/organization/location/geo-political spans,
//!   trimmed and title-cased; normalized texts of two characters or fewer,
//!   or purely numeric, are dropped
//! - keywords: only nouns, proper nouns and adjectives, never stopwords,
//!   surface form longer than three characters; counted by lowercased lemma
//!
//! Ranking is by descending count. Ties keep whatever order the counting
//! table iterates in; callers must not rely on tie order.

use chrono::Local;
use itertools::Itertools;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, info, instrument, warn};

use crate::annotate::{Annotate, EntityLabel, PartOfSpeech};
use crate::models::{ArticleRecord, TermCount, TopicSummary};
use crate::utils::{is_purely_numeric, title_case, truncate_for_log};

/// Global entity ranking depth.
const TOP_ENTITIES: usize = 50;
/// Global keyword ranking depth.
const TOP_KEYWORDS: usize = 100;
/// Per-source entity ranking depth.
const TOP_ENTITIES_PER_SOURCE: usize = 20;
/// Keywords must be longer than this many characters.
const KEYWORD_MIN_CHARS: usize = 3;
/// Normalized entities must be longer than this many characters.
const ENTITY_MIN_CHARS: usize = 2;

/// Computes topic summaries from article batches.
pub struct Aggregator<A> {
    annotator: A,
}

impl<A> Aggregator<A>
where
    A: Annotate,
{
    pub fn new(annotator: A) -> Self {
        Self { annotator }
    }

    /// Tally entities and keywords across the batch and rank them.
    ///
    /// Articles with empty content count toward `total_articles` and the
    /// source set but contribute nothing to any counter. An annotator
    /// failure on one article skips that article only. An empty batch
    /// yields `None`; there is nothing to persist.
    #[instrument(level = "info", skip_all, fields(batch = batch.len()))]
    pub async fn analyze(&self, batch: &[ArticleRecord]) -> Option<TopicSummary> {
        if batch.is_empty() {
            return None;
        }

        let mut entity_counts: HashMap<String, u64> = HashMap::new();
        let mut entity_counts_by_source: HashMap<String, HashMap<String, u64>> = HashMap::new();
        let mut keyword_counts: HashMap<String, u64> = HashMap::new();
        let mut sources: BTreeSet<String> = BTreeSet::new();

        for article in batch {
            sources.insert(article.source.clone());
            if article.content.is_empty() {
                continue;
            }

            let annotations = match self.annotator.annotate(&article.content).await {
                Ok(annotations) => annotations,
                Err(e) => {
                    warn!(
                        url = %article.url,
                        error = %e,
                        preview = %truncate_for_log(&article.content, 120),
                        "Annotation failed; skipping article"
                    );
                    continue;
                }
            };
            debug!(
                url = %article.url,
                entities = annotations.entities.len(),
                tokens = annotations.tokens.len(),
                "Annotated article"
            );

            for span in &annotations.entities {
                if !matches!(
                    span.label,
                    EntityLabel::Person
                        | EntityLabel::Organization
                        | EntityLabel::Location
                        | EntityLabel::GeoPolitical
                ) {
                    continue;
                }
                let text = title_case(span.text.trim());
                if text.chars().count() <= ENTITY_MIN_CHARS || is_purely_numeric(&text) {
                    continue;
                }
                *entity_counts.entry(text.clone()).or_insert(0) += 1;
                *entity_counts_by_source
                    .entry(article.source.clone())
                    .or_default()
                    .entry(text)
                    .or_insert(0) += 1;
            }

            for token in &annotations.tokens {
                if !matches!(
                    token.pos,
                    PartOfSpeech::Noun | PartOfSpeech::ProperNoun | PartOfSpeech::Adjective
                ) {
                    continue;
                }
                if token.is_stop || token.text.chars().count() <= KEYWORD_MIN_CHARS {
                    continue;
                }
                *keyword_counts.entry(token.lemma.to_lowercase()).or_insert(0) += 1;
            }
        }

        let summary = TopicSummary {
            date: Local::now().format("%Y-%m-%d").to_string(),
            total_articles: batch.len(),
            sources: sources.into_iter().collect(),
            top_entities: most_common(&entity_counts, TOP_ENTITIES),
            top_keywords: most_common(&keyword_counts, TOP_KEYWORDS),
            top_entities_by_source: entity_counts_by_source
                .iter()
                .map(|(source, counts)| {
                    (source.clone(), most_common(counts, TOP_ENTITIES_PER_SOURCE))
                })
                .collect::<BTreeMap<_, _>>(),
        };
        info!(
            total_articles = summary.total_articles,
            entities = summary.top_entities.len(),
            keywords = summary.top_keywords.len(),
            "Aggregation complete"
        );
        Some(summary)
    }
}

/// The `n` highest-count terms, count descending.
fn most_common(counts: &HashMap<String, u64>, n: usize) -> Vec<TermCount> {
    counts
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1))
        .take(n)
        .map(|(text, count)| TermCount {
            text: text.clone(),
            count: *count,
        })
        .collect()
}
