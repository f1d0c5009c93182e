//! The source registry: which outlets we read and how we reach them.
//!
//! Every source is described by a [`Source`] record. Adding or removing an
//! outlet is a data change, not a code change: edit the YAML registry passed
//! via `--sources`, or rely on the compiled-in defaults below.
//!
//! Two access strategies exist:
//!
//! - **Feed**: the outlet publishes an RSS feed (`use_feed: true`,
//!   `feed_url` required). Preferred when available.
//! - **Homepage**: article links are pulled off the homepage with a CSS
//!   selector (`use_feed: false`, `link_selector` required).
//!
//! The registry also centralizes the access policy shared by every request:
//! the identifying User-Agent, the per-request timeout, and the minimum
//! per-domain pacing interval.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::time::Duration;
use tokio::fs;
use tracing::info;

/// Identifying User-Agent sent with every request.
pub const USER_AGENT: &str =
    "notiziario/0.1 (news topic analyzer; +https://github.com/notiziario/notiziario)";

/// Minimum time between two requests to the same domain.
pub const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(3);

/// Fixed per-request socket timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// One configured news outlet.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Source {
    /// Display name, unique within the registry.
    pub name: String,
    /// Homepage URL, also the base for resolving relative article links.
    pub homepage_url: String,
    /// RSS feed URL. Required when `use_feed` is true.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feed_url: Option<String>,
    /// CSS selector locating article links on the homepage.
    /// Required when `use_feed` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_selector: Option<String>,
    /// Collection strategy switch: feed when true, homepage otherwise.
    pub use_feed: bool,
}

impl Source {
    /// Check that the source carries the fields its strategy needs.
    pub fn validate(&self) -> Result<(), Box<dyn Error>> {
        if self.use_feed && self.feed_url.is_none() {
            return Err(format!("source {:?} uses a feed but has no feed_url", self.name).into());
        }
        if !self.use_feed && self.link_selector.is_none() {
            return Err(format!(
                "source {:?} scrapes its homepage but has no link_selector",
                self.name
            )
            .into());
        }
        Ok(())
    }
}

/// The built-in registry of Italian outlets.
pub fn default_sources() -> Vec<Source> {
    vec![
        Source {
            name: "La Repubblica".to_string(),
            homepage_url: "https://www.repubblica.it/".to_string(),
            feed_url: Some("https://www.repubblica.it/rss/homepage/rss2.0.xml".to_string()),
            link_selector: Some("a.headline-link".to_string()),
            use_feed: true,
        },
        Source {
            name: "Corriere della Sera".to_string(),
            homepage_url: "https://www.corriere.it/".to_string(),
            feed_url: Some("https://www.corriere.it/rss/homepage.xml".to_string()),
            link_selector: Some("a.title-art".to_string()),
            use_feed: true,
        },
        Source {
            name: "Il Sole 24 Ore".to_string(),
            homepage_url: "https://www.ilsole24ore.com/".to_string(),
            feed_url: Some("https://www.ilsole24ore.com/rss/italia.xml".to_string()),
            link_selector: Some("a.apicella".to_string()),
            use_feed: true,
        },
        Source {
            name: "La Stampa".to_string(),
            homepage_url: "https://www.lastampa.it/".to_string(),
            feed_url: Some("https://www.lastampa.it/rss/home.xml".to_string()),
            link_selector: Some("a.entry__title".to_string()),
            use_feed: true,
        },
        Source {
            name: "Il Fatto Quotidiano".to_string(),
            homepage_url: "https://www.ilfattoquotidiano.it/".to_string(),
            feed_url: Some("https://www.ilfattoquotidiano.it/feed/".to_string()),
            link_selector: Some("h2.entry-title a".to_string()),
            use_feed: true,
        },
    ]
}

/// Load and validate the source registry.
///
/// With a path, the registry is read from a YAML list of [`Source`] records;
/// without one, the compiled-in defaults are used. An empty registry or a
/// source violating its strategy invariant is a startup error.
pub async fn load_sources(path: Option<&str>) -> Result<Vec<Source>, Box<dyn Error>> {
    let sources: Vec<Source> = match path {
        Some(path) => {
            let raw = fs::read_to_string(path).await?;
            serde_yaml::from_str(&raw)?
        }
        None => default_sources(),
    };
    if sources.is_empty() {
        return Err("source registry is empty".into());
    }
    for source in &sources {
        source.validate()?;
    }
    info!(count = sources.len(), "Loaded source registry");
    Ok(sources)
}

/// Build the HTTP client every network call goes through.
pub fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_source() -> Source {
        Source {
            name: "Test".to_string(),
            homepage_url: "https://news.example/".to_string(),
            feed_url: Some("https://news.example/rss.xml".to_string()),
            link_selector: None,
            use_feed: true,
        }
    }

    #[test]
    fn test_feed_source_without_feed_url_is_invalid() {
        let mut source = feed_source();
        source.feed_url = None;
        assert!(source.validate().is_err());
    }

    #[test]
    fn test_homepage_source_without_selector_is_invalid() {
        let mut source = feed_source();
        source.use_feed = false;
        source.link_selector = None;
        assert!(source.validate().is_err());
    }

    #[test]
    fn test_homepage_source_with_selector_is_valid() {
        let mut source = feed_source();
        source.use_feed = false;
        source.feed_url = None;
        source.link_selector = Some("a.article".to_string());
        assert!(source.validate().is_ok());
    }

    #[test]
    fn test_default_sources_all_validate() {
        let sources = default_sources();
        assert!(!sources.is_empty());
        for source in &sources {
            assert!(source.validate().is_ok(), "invalid default: {}", source.name);
        }
    }

    #[test]
    fn test_registry_yaml_round_trip() {
        let yaml = r#"
- name: Gazzetta di Prova
  homepage_url: https://gazzetta.example/
  feed_url: https://gazzetta.example/feed.xml
  use_feed: true
- name: Cronaca Locale
  homepage_url: https://cronaca.example/
  link_selector: "h2.entry-title a"
  use_feed: false
"#;
        let sources: Vec<Source> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(sources.len(), 2);
        assert_eq!(sources[0].name, "Gazzetta di Prova");
        assert!(sources[0].use_feed);
        assert_eq!(
            sources[1].link_selector.as_deref(),
            Some("h2.entry-title a")
        );
        for source in &sources {
            assert!(source.validate().is_ok());
        }
    }
}
