// Retry policy and backoff sleeping
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::http::RawResponse;

pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Retry configuration
///
/// Transient failures get a flat delay, rate limits wait for the reset header.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Hard cap on attempts for one logical call (first try included)
    pub max_attempts: u32,
    /// Flat wait after timeouts, connection errors and unexpected statuses
    pub retry_delay: Duration,
    /// Longest single sleep; longer waits are split into pieces of this size
    pub max_sleep_increment: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            retry_delay: Duration::from_secs(10),
            max_sleep_increment: Duration::from_secs(500),
        }
    }
}

impl RetryConfig {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }
}

/// True when a 403 is GitHub telling us the hourly quota is gone
///
/// A missing or garbled header means the 403 is a plain permission problem.
pub fn is_rate_limited(response: &RawResponse) -> bool {
    response
        .header(RATE_LIMIT_REMAINING)
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|remaining| remaining <= 0)
        .unwrap_or(false)
}

/// How long to wait for the quota to come back
///
/// Uses `X-RateLimit-Reset` (unix seconds) relative to `now`. Falls back to
/// `fallback` when the header is missing, unparseable, or already in the past.
pub fn rate_limit_wait(response: &RawResponse, now: DateTime<Utc>, fallback: Duration) -> Duration {
    let reset = response
        .header(RATE_LIMIT_RESET)
        .and_then(|v| v.trim().parse::<i64>().ok());

    match reset {
        Some(reset) if reset > now.timestamp() => {
            Duration::from_secs((reset - now.timestamp()) as u64)
        }
        _ => fallback,
    }
}

/// Split a wait into pieces no longer than `increment`
pub fn sleep_increments(total: Duration, increment: Duration) -> Vec<Duration> {
    let mut pieces = Vec::new();
    if increment.is_zero() {
        if !total.is_zero() {
            pieces.push(total);
        }
        return pieces;
    }

    let mut remaining = total;
    while !remaining.is_zero() {
        let step = remaining.min(increment);
        pieces.push(step);
        remaining -= step;
    }
    pieces
}

/// Sleep for `total`, one capped increment at a time, logging as we go
pub async fn sleep_in_increments(total: Duration, increment: Duration) {
    let mut remaining = total;
    for step in sleep_increments(total, increment) {
        if step < remaining {
            warn!(
                "Sleeping {}s of remaining {}s",
                step.as_secs(),
                remaining.as_secs()
            );
        } else {
            debug!("Sleeping {}s", step.as_secs());
        }
        sleep(step).await;
        remaining = remaining.saturating_sub(step);
    }
}
