//! Rate-limit backoff policy.
//!
//! Only HTTP 429 is retried. The wait comes from the response's `Retry-After`
//! header (delta-seconds) and falls back to [`RETRY_DELAY`].

use std::time::Duration;

use reqwest::header::{HeaderMap, RETRY_AFTER};

/// Maximum number of retries after the initial attempt.
pub const MAX_RETRIES: u32 = 3;

/// Delay used when the server does not say how long to wait.
pub const RETRY_DELAY: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay: RETRY_DELAY,
        }
    }
}

/// Retry bookkeeping for one logical call.
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    retries: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy, retries: 0 }
    }

    /// Retries performed so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Network attempts issued so far, counting the one in flight.
    pub fn attempts(&self) -> u32 {
        self.retries + 1
    }

    pub fn max_retries(&self) -> u32 {
        self.policy.max_retries
    }

    /// Record a rate-limited response.
    ///
    /// Returns the delay to wait before the next attempt, or `None` once the
    /// retry budget is spent.
    pub fn on_rate_limited(&mut self, headers: &HeaderMap) -> Option<Duration> {
        if self.retries >= self.policy.max_retries {
            return None;
        }
        self.retries += 1;
        Some(retry_after(headers).unwrap_or(self.policy.base_delay))
    }
}

/// Parse `Retry-After` as whole seconds.
///
/// Absent, non-numeric, and HTTP-date values all yield `None`.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;

    fn headers_with_retry_after(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(RETRY_AFTER, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_retry_after_seconds() {
        let headers = headers_with_retry_after("2");
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(2)));
    }

    #[test]
    fn test_retry_after_tolerates_whitespace() {
        let headers = headers_with_retry_after(" 15 ");
        assert_eq!(retry_after(&headers), Some(Duration::from_secs(15)));
    }

    #[test]
    fn test_retry_after_missing() {
        assert_eq!(retry_after(&HeaderMap::new()), None);
    }

    #[test]
    fn test_retry_after_unparsable() {
        assert_eq!(retry_after(&headers_with_retry_after("soon")), None);
        assert_eq!(retry_after(&headers_with_retry_after("-5")), None);
        assert_eq!(
            retry_after(&headers_with_retry_after("Wed, 21 Oct 2015 07:28:00 GMT")),
            None
        );
    }

    #[test]
    fn test_retry_state_uses_header_then_default() {
        let mut state = RetryState::new(RetryPolicy::default());

        let delay = state.on_rate_limited(&headers_with_retry_after("2"));
        assert_eq!(delay, Some(Duration::from_secs(2)));

        let delay = state.on_rate_limited(&HeaderMap::new());
        assert_eq!(delay, Some(RETRY_DELAY));

        let delay = state.on_rate_limited(&headers_with_retry_after("bogus"));
        assert_eq!(delay, Some(RETRY_DELAY));
    }

    #[test]
    fn test_retry_state_budget_is_bounded() {
        let mut state = RetryState::new(RetryPolicy::default());
        let headers = HeaderMap::new();

        for _ in 0..MAX_RETRIES {
            assert!(state.on_rate_limited(&headers).is_some());
        }
        assert_eq!(state.retries(), MAX_RETRIES);
        assert_eq!(state.attempts(), MAX_RETRIES + 1);

        assert_eq!(state.on_rate_limited(&headers), None);
        assert_eq!(state.on_rate_limited(&headers), None);
        assert_eq!(state.retries(), MAX_RETRIES);
    }

    #[test]
    fn test_retry_state_zero_budget() {
        let mut state = RetryState::new(RetryPolicy {
            max_retries: 0,
            base_delay: Duration::from_millis(1),
        });

        assert_eq!(state.on_rate_limited(&HeaderMap::new()), None);
        assert_eq!(state.attempts(), 1);
    }
}
