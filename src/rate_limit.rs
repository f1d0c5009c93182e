//! Per-domain request pacing.
//!
//! Scraping third-party sites politely means never hammering one host:
//! consecutive requests to the same domain are kept at least
//! [`MIN_REQUEST_INTERVAL`](crate::sources::MIN_REQUEST_INTERVAL) apart,
//! while requests to distinct domains proceed without waiting.
//!
//! The limiter is an owned value handed `&mut` to whichever component is
//! currently issuing requests. Callers must stay sequential: the timestamp
//! table is a bare read-check-write and two concurrent callers against the
//! same domain could both observe a stale timestamp and under-wait.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::debug;
use url::Url;

use crate::sources::MIN_REQUEST_INTERVAL;

/// Tracks the last request instant per domain and enforces a minimum
/// interval between requests to the same domain.
#[derive(Debug)]
pub struct RateLimiter {
    interval: Duration,
    last_request: HashMap<String, Instant>,
}

impl RateLimiter {
    /// A limiter with the standard pacing interval.
    pub fn new() -> Self {
        Self::with_interval(MIN_REQUEST_INTERVAL)
    }

    /// A limiter with a custom interval.
    pub fn with_interval(interval: Duration) -> Self {
        Self {
            interval,
            last_request: HashMap::new(),
        }
    }

    /// Wait until a request to `url` is allowed, then record the attempt.
    ///
    /// Guarantees that when this returns, at least the configured interval
    /// has passed since the previous `acquire` for the same domain. The
    /// first acquire for a domain returns immediately. The timestamp is
    /// recorded as the last action before returning, and it is recorded for
    /// every attempt, whether or not the request that follows succeeds.
    pub async fn acquire(&mut self, url: &str) {
        let domain = domain_of(url);
        if let Some(last) = self.last_request.get(&domain) {
            let elapsed = last.elapsed();
            if elapsed < self.interval {
                let wait = self.interval - elapsed;
                debug!(%domain, wait_ms = wait.as_millis() as u64, "Rate limit: pausing");
                sleep(wait).await;
            }
        }
        self.last_request.insert(domain, Instant::now());
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// The pacing key for a URL: its host, or the whole string when it does
/// not parse as a URL (never merging unrelated requests under one key).
fn domain_of(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(str::to_string))
        .unwrap_or_else(|| url.to_string())
}
