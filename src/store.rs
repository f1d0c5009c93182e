//! Snapshot persistence: dated article batches and topic summaries.
//!
//! One directory holds everything:
//!
//! ```text
//! _data/
//! ├── articles_2026-08-05.json   # one batch per calendar day
//! ├── articles_2026-08-06.json
//! ├── topics_2026-08-06.json     # dated summary
//! └── topics.json                # latest summary, overwritten every run
//! ```
//!
//! Batch filenames embed a zero-padded year-month-day date, so the
//! lexicographically greatest filename is also the chronologically most
//! recent one; `load_latest` relies on exactly that. Re-running on the
//! same day overwrites that day's file, there is no merging.

use chrono::Local;
use std::error::Error;
use std::path::PathBuf;
use tokio::fs;
use tracing::{error, info, instrument, warn};

use crate::models::{ArticleRecord, TopicSummary};

const BATCH_PREFIX: &str = "articles_";
const BATCH_SUFFIX: &str = ".json";

/// File-backed store for article batches and topic summaries.
#[derive(Debug, Clone)]
pub struct ArticleStore {
    data_dir: PathBuf,
}

impl ArticleStore {
    /// Open a store rooted at `data_dir`, creating the directory if needed.
    pub async fn new(data_dir: impl Into<PathBuf>) -> Result<Self, Box<dyn Error>> {
        let data_dir = data_dir.into();
        fs::create_dir_all(&data_dir).await?;
        Ok(Self { data_dir })
    }

    /// Persist the batch under today's date, overwriting any earlier run.
    #[instrument(level = "info", skip_all, fields(count = articles.len()))]
    pub async fn save_batch(&self, articles: &[ArticleRecord]) -> Result<PathBuf, Box<dyn Error>> {
        let date = Local::now().format("%Y-%m-%d");
        let path = self
            .data_dir
            .join(format!("{BATCH_PREFIX}{date}{BATCH_SUFFIX}"));
        let json = serde_json::to_string_pretty(articles)?;
        fs::write(&path, json).await?;
        info!(path = %path.display(), "Saved article batch");
        Ok(path)
    }

    /// Load the most recently dated batch, or an empty batch if none exists.
    ///
    /// A missing or unreadable batch is a recoverable condition: the caller
    /// gets an empty batch and decides how to report it. Only listing the
    /// directory itself can fail hard.
    #[instrument(level = "info", skip_all)]
    pub async fn load_latest(&self) -> Result<Vec<ArticleRecord>, Box<dyn Error>> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.data_dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(BATCH_PREFIX) && name.ends_with(BATCH_SUFFIX) {
                names.push(name);
            }
        }

        let Some(latest) = names.into_iter().max() else {
            warn!(dir = %self.data_dir.display(), "No article batches found");
            return Ok(Vec::new());
        };

        let path = self.data_dir.join(&latest);
        let raw = fs::read_to_string(&path).await?;
        match serde_json::from_str::<Vec<ArticleRecord>>(&raw) {
            Ok(articles) => {
                info!(count = articles.len(), path = %path.display(), "Loaded article batch");
                Ok(articles)
            }
            Err(e) => {
                error!(path = %path.display(), error = %e, "Batch file is unreadable");
                Ok(Vec::new())
            }
        }
    }

    /// Persist a summary twice: dated, and as the fixed `topics.json`.
    #[instrument(level = "info", skip_all, fields(date = %summary.date))]
    pub async fn save_summary(&self, summary: &TopicSummary) -> Result<PathBuf, Box<dyn Error>> {
        let json = serde_json::to_string_pretty(summary)?;

        let dated = self.data_dir.join(format!("topics_{}.json", summary.date));
        fs::write(&dated, &json).await?;

        let current = self.data_dir.join("topics.json");
        fs::write(&current, &json).await?;

        info!(dated = %dated.display(), current = %current.display(), "Saved topic summary");
        Ok(current)
    }
}
