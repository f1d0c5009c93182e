//! The text annotation capability consumed by the aggregator.
//!
//! The aggregator does not care which model does the annotating; anything
//! implementing [`Annotate`] works. The contract, per text:
//!
//! - a list of named-entity spans (`{text, label}`, spaCy-style labels:
//!   `PER`, `ORG`, `LOC`, `GPE`, anything else folds into a catch-all)
//! - a list of tokens (`{text, lemma, pos, is_stop}`, UPOS part-of-speech
//!   tags: `NOUN`, `PROPN`, `ADJ`, catch-all for the rest)
//!
//! The production implementation, [`HttpAnnotator`], talks JSON over HTTP
//! to an annotation service (`POST /annotate`), probing `GET /health` at
//! startup so a missing service fails the run before any work is done.
//! [`RetryAnnotate`] wraps any implementation with jittered exponential
//! backoff for transient errors. Tests substitute canned implementations.

use rand::{Rng, rng};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};
use url::Url;

/// A named-entity span reported by the annotator.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: EntityLabel,
}

/// Entity classes the aggregator distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum EntityLabel {
    #[serde(rename = "PER")]
    Person,
    #[serde(rename = "ORG")]
    Organization,
    #[serde(rename = "LOC")]
    Location,
    #[serde(rename = "GPE")]
    GeoPolitical,
    /// Any label the aggregator does not count.
    #[serde(other)]
    Other,
}

/// One token of the annotated text.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Token {
    pub text: String,
    pub lemma: String,
    pub pos: PartOfSpeech,
    #[serde(default)]
    pub is_stop: bool,
}

/// Part-of-speech classes the aggregator distinguishes (UPOS tags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum PartOfSpeech {
    #[serde(rename = "NOUN")]
    Noun,
    #[serde(rename = "PROPN")]
    ProperNoun,
    #[serde(rename = "ADJ")]
    Adjective,
    #[serde(other)]
    Other,
}

/// Everything the annotator reports for one text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Annotations {
    #[serde(default)]
    pub entities: Vec<EntitySpan>,
    #[serde(default)]
    pub tokens: Vec<Token>,
}

/// The annotation capability.
pub trait Annotate {
    /// Annotate one text, returning its entity spans and tokens.
    async fn annotate(&self, text: &str) -> Result<Annotations, Box<dyn Error>>;
}

#[derive(Serialize)]
struct AnnotateRequest<'a> {
    text: &'a str,
}

/// JSON-over-HTTP annotator client.
#[derive(Debug, Clone)]
pub struct HttpAnnotator {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAnnotator {
    /// Connect to an annotation service, probing its health endpoint.
    ///
    /// A failed probe is the one unrecoverable error in the system: every
    /// downstream analysis step is meaningless without the annotator, so
    /// the error propagates instead of degrading.
    #[instrument(level = "info", skip(client))]
    pub async fn connect(
        client: reqwest::Client,
        base_url: &str,
    ) -> Result<Self, Box<dyn Error>> {
        let base_url = Url::parse(base_url)?;
        let health = base_url.join("health")?;
        client.get(health).send().await?.error_for_status()?;
        info!(url = %base_url, "Annotator service is reachable");
        Ok(Self { client, base_url })
    }
}

impl Annotate for HttpAnnotator {
    async fn annotate(&self, text: &str) -> Result<Annotations, Box<dyn Error>> {
        let endpoint = self.base_url.join("annotate")?;
        let response = self
            .client
            .post(endpoint)
            .json(&AnnotateRequest { text })
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<Annotations>().await?)
    }
}

/// Adds jittered exponential backoff to any [`Annotate`] implementation.
///
/// The delay doubles per attempt from `base_delay`, capped at 30 seconds,
/// plus up to 250 ms of random jitter.
pub struct RetryAnnotate<T> {
    inner: T,
    max_retries: usize,
    base_delay: Duration,
    max_delay: Duration,
}

impl<T> RetryAnnotate<T>
where
    T: Annotate,
{
    pub fn new(inner: T, max_retries: usize, base_delay: Duration) -> Self {
        Self {
            inner,
            max_retries,
            base_delay,
            max_delay: Duration::from_secs(30),
        }
    }
}

impl<T> fmt::Debug for RetryAnnotate<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryAnnotate")
            .field("max_retries", &self.max_retries)
            .field("base_delay", &self.base_delay)
            .field("max_delay", &self.max_delay)
            .finish()
    }
}

impl<T> Annotate for RetryAnnotate<T>
where
    T: Annotate,
{
    async fn annotate(&self, text: &str) -> Result<Annotations, Box<dyn Error>> {
        let mut attempt = 0usize;
        loop {
            match self.inner.annotate(text).await {
                Ok(annotations) => return Ok(annotations),
                Err(e) => {
                    attempt += 1;
                    if attempt > self.max_retries {
                        error!(
                            attempt,
                            max = self.max_retries,
                            error = %e,
                            "annotate() exhausted retries"
                        );
                        return Err(e);
                    }

                    let mut delay = self.base_delay.saturating_mul(1 << (attempt - 1));
                    if delay > self.max_delay {
                        delay = self.max_delay;
                    }
                    let jitter_ms: u64 = rng().random_range(0..=250);
                    let delay = delay + Duration::from_millis(jitter_ms);

                    warn!(
                        attempt,
                        max = self.max_retries,
                        ?delay,
                        error = %e,
                        "annotate() attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_entity_label_deserialization() {
        let span: EntitySpan =
            serde_json::from_str(r#"{"text": "Mario Rossi", "label": "PER"}"#).unwrap();
        assert_eq!(span.label, EntityLabel::Person);

        let span: EntitySpan =
            serde_json::from_str(r#"{"text": "Roma", "label": "GPE"}"#).unwrap();
        assert_eq!(span.label, EntityLabel::GeoPolitical);
    }

    #[test]
    fn test_unknown_labels_fold_into_other() {
        let span: EntitySpan =
            serde_json::from_str(r#"{"text": "venerdì", "label": "DATE"}"#).unwrap();
        assert_eq!(span.label, EntityLabel::Other);

        let token: Token = serde_json::from_str(
            r#"{"text": "visita", "lemma": "visitare", "pos": "VERB", "is_stop": false}"#,
        )
        .unwrap();
        assert_eq!(token.pos, PartOfSpeech::Other);
    }

    #[test]
    fn test_annotations_tolerate_missing_fields() {
        let annotations: Annotations = serde_json::from_str("{}").unwrap();
        assert!(annotations.entities.is_empty());
        assert!(annotations.tokens.is_empty());

        let token: Token =
            serde_json::from_str(r#"{"text": "governo", "lemma": "governo", "pos": "NOUN"}"#)
                .unwrap();
        assert!(!token.is_stop);
    }

    struct Flaky {
        failures_left: Cell<u32>,
    }

    impl Annotate for Flaky {
        async fn annotate(&self, _text: &str) -> Result<Annotations, Box<dyn Error>> {
            if self.failures_left.get() > 0 {
                self.failures_left.set(self.failures_left.get() - 1);
                return Err("transient failure".into());
            }
            Ok(Annotations::default())
        }
    }

    #[tokio::test]
    async fn test_retry_recovers_from_transient_failures() {
        let flaky = Flaky {
            failures_left: Cell::new(2),
        };
        let retry = RetryAnnotate::new(flaky, 3, Duration::from_millis(1));
        assert!(retry.annotate("testo").await.is_ok());
    }

    #[tokio::test]
    async fn test_retry_gives_up_after_max_attempts() {
        let flaky = Flaky {
            failures_left: Cell::new(100),
        };
        let retry = RetryAnnotate::new(flaky, 2, Duration::from_millis(1));
        assert!(retry.annotate("testo").await.is_err());
    }
}
