//! # Notiziario
//!
//! Collects articles from a fixed registry of Italian news outlets,
//! extracts their text, and distills the day's most frequent named
//! entities and keywords into dated JSON snapshots.
//!
//! ## Pipelines
//!
//! The binary exposes two independent runs that communicate only through
//! files in the data directory:
//!
//! 1. **collect**: discover candidate articles per source (RSS feed or
//!    homepage scraping), download and extract each article's text, and
//!    persist the batch as `articles_<date>.json`
//! 2. **analyze**: load the most recent batch, run it through the text
//!    annotation service, tally entity and keyword frequencies, and
//!    persist the ranked summary as `topics_<date>.json` plus the
//!    always-current `topics.json`
//!
//! ## Politeness
//!
//! All network traffic is sequential and paced by a per-domain rate
//! limiter: consecutive requests to the same host stay at least three
//! seconds apart. A full collection run trades throughput for courtesy
//! and is expected to take minutes.
//!
//! ## Failure posture
//!
//! A broken feed, a moved homepage or an unparseable article never aborts
//! a run; it means fewer results and a logged reason. The one fatal error
//! is an unreachable annotation service at analysis startup.

use clap::Parser;
use std::error::Error;
use tracing::{error, info, instrument};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregate;
mod annotate;
mod cli;
mod collect;
mod extract;
mod models;
mod rate_limit;
mod sources;
mod store;
mod utils;

use aggregate::Aggregator;
use annotate::{HttpAnnotator, RetryAnnotate};
use cli::{Cli, Command};
use models::ArticleRecord;
use rate_limit::RateLimiter;
use store::ArticleStore;
use utils::ensure_writable_dir;

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("notiziario starting up");

    let args = Cli::parse();

    // Catch an unwritable data directory before any network work
    if let Err(e) = ensure_writable_dir(&args.data_dir).await {
        error!(
            path = %args.data_dir,
            error = %e,
            "Data directory is not writable (fix perms or choose a different path)"
        );
        return Err(e);
    }

    match &args.command {
        Command::Collect => run_collection(&args).await?,
        Command::Analyze { annotator_url } => run_analysis(&args, annotator_url).await?,
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        "Execution complete"
    );
    Ok(())
}

/// Collect candidates, extract their contents, persist the day's batch.
#[instrument(level = "info", skip_all)]
async fn run_collection(args: &Cli) -> Result<(), Box<dyn Error>> {
    let registry = sources::load_sources(args.sources.as_deref()).await?;
    let client = sources::http_client()?;
    let mut limiter = RateLimiter::new();

    let candidates = collect::collect_all(&client, &mut limiter, &registry).await;
    if candidates.is_empty() {
        error!("No candidate articles found across any source; nothing to persist");
        return Ok(());
    }

    let records = extract::extract_all(&client, &mut limiter, candidates).await;

    // empty content marks a failed extraction; those records stop here
    let kept: Vec<ArticleRecord> = records
        .into_iter()
        .filter(|record| !record.content.is_empty())
        .collect();
    if kept.is_empty() {
        error!("Extraction produced no usable articles; nothing to persist");
        return Ok(());
    }

    let store = ArticleStore::new(&args.data_dir).await?;
    let path = store.save_batch(&kept).await?;
    info!(
        count = kept.len(),
        path = %path.display(),
        "Collection run complete"
    );
    Ok(())
}

/// Load the latest batch, aggregate it, persist the topic summary.
#[instrument(level = "info", skip_all)]
async fn run_analysis(args: &Cli, annotator_url: &str) -> Result<(), Box<dyn Error>> {
    let client = sources::http_client()?;
    // the one unrecoverable failure: no annotator, no analysis
    let annotator = HttpAnnotator::connect(client, annotator_url).await?;
    let annotator = RetryAnnotate::new(annotator, 3, std::time::Duration::from_secs(1));

    let store = ArticleStore::new(&args.data_dir).await?;
    let batch = store.load_latest().await?;

    let aggregator = Aggregator::new(annotator);
    match aggregator.analyze(&batch).await {
        Some(summary) => {
            let path = store.save_summary(&summary).await?;
            info!(
                total_articles = summary.total_articles,
                sources = summary.sources.len(),
                path = %path.display(),
                "Analysis run complete"
            );
        }
        None => {
            error!("No articles available to analyze; nothing to do");
        }
    }
    Ok(())
}
