//! Rate limit signals from GitHub responses.

use reqwest::StatusCode;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Header carrying the Unix time at which the current window resets.
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

const SECONDARY_RATE_LIMIT: &str = "secondary rate limit";

/// Timing hints attached to a response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RateLimitWindow {
    /// When the window resets, from `x-ratelimit-reset`.
    pub reset_at: Option<SystemTime>,
    /// How long to wait, from `retry-after`.
    pub retry_after: Option<Duration>,
}

impl RateLimitWindow {
    /// Read the timing headers. Unparseable values are ignored.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let number = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<u64>().ok())
        };

        Self {
            reset_at: number(RATE_LIMIT_RESET).map(|secs| UNIX_EPOCH + Duration::from_secs(secs)),
            retry_after: number(RETRY_AFTER.as_str()).map(Duration::from_secs),
        }
    }

    /// How long to wait before retrying.
    ///
    /// `retry-after` wins over the reset time; a reset time in the past means
    /// no wait; without either, `default_wait` applies.
    pub fn wait_from(&self, now: SystemTime, default_wait: Duration) -> Duration {
        if let Some(retry_after) = self.retry_after {
            return retry_after;
        }
        match self.reset_at {
            Some(reset_at) => reset_at.duration_since(now).unwrap_or(Duration::ZERO),
            None => default_wait,
        }
    }
}

/// Whether a response is GitHub's secondary rate limit.
///
/// Only this signal is retried; a plain 403 is a permission problem.
pub fn is_secondary_rate_limit(status: StatusCode, message: Option<&str>) -> bool {
    matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS
    ) && message.is_some_and(|m| m.to_ascii_lowercase().contains(SECONDARY_RATE_LIMIT))
}
