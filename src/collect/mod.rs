//! Candidate discovery: turn each configured source into a bounded list of
//! article references.
//!
//! Two strategies live in submodules, selected per source:
//!
//! - [`feed`]: parse the outlet's RSS feed (preferred when configured)
//! - [`homepage`]: pull article links off the homepage with the source's
//!   CSS selector, then fetch a title for each link
//!
//! Whatever the strategy, the output is the same: up to
//! [`PER_SOURCE_LIMIT`] [`ArticleRef`]s per source. Failures are isolated
//! per source: a dead feed or an unreachable homepage yields zero
//! candidates for that outlet and leaves every other outlet untouched.

pub mod feed;
pub mod homepage;

use reqwest::Client;
use tracing::{error, info, instrument};

use crate::models::ArticleRef;
use crate::rate_limit::RateLimiter;
use crate::sources::Source;

/// Cap on candidates per source and per run.
pub const PER_SOURCE_LIMIT: usize = 10;

/// Collect candidate articles from one source.
///
/// Dispatches on the source's strategy. Any failure is logged and reported
/// as an empty candidate list; it never propagates.
#[instrument(level = "info", skip_all, fields(source = %source.name))]
pub async fn collect(
    client: &Client,
    limiter: &mut RateLimiter,
    source: &Source,
) -> Vec<ArticleRef> {
    let outcome = if source.use_feed {
        feed::fetch(client, limiter, source).await
    } else {
        homepage::fetch(client, limiter, source).await
    };
    match outcome {
        Ok(candidates) => {
            info!(count = candidates.len(), "Collected candidate articles");
            candidates
        }
        Err(e) => {
            error!(error = %e, "Collection failed for source");
            Vec::new()
        }
    }
}

/// Collect candidates from every configured source, in order.
///
/// Sources are visited one at a time; the rate limiter's pacing guarantee
/// only holds when requests are issued sequentially.
#[instrument(level = "info", skip_all)]
pub async fn collect_all(
    client: &Client,
    limiter: &mut RateLimiter,
    sources: &[Source],
) -> Vec<ArticleRef> {
    info!(sources = sources.len(), "Starting collection");
    let mut all = Vec::new();
    for source in sources {
        let candidates = collect(client, limiter, source).await;
        all.extend(candidates);
    }
    info!(count = all.len(), "Collection finished across all sources");
    all
}
