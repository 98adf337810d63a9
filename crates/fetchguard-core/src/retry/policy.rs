use std::collections::BTreeSet;
use std::time::Duration;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::error::Failure;

/// Upper bound (exclusive) of the random jitter added to every backoff delay.
pub const JITTER_CEILING_MS: u64 = 1000;

/// Decision returned by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// Do not retry; the failure is terminal.
    NoRetry,
    /// Retry after the given delay.
    RetryAfter(Duration),
}

/// Exponential backoff policy with caps.
///
/// The executor reads the *current* policy at every retry decision, so a
/// policy swapped in mid-flight governs the next decision of loops that are
/// already running.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Master switch. When false every failure is terminal.
    pub enable_retry: bool,
    /// Retries after the first attempt (so `max_retries + 1` attempts total).
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound on the exponential part of the delay.
    pub max_delay_ms: u64,
    /// Multiplier applied per retry.
    pub backoff_factor: f64,
    /// Status codes eligible for retry.
    pub retryable_status_codes: BTreeSet<u16>,
    /// Per-attempt deadline when the caller gives none.
    pub timeout_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            enable_retry: true,
            max_retries: 3,
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            backoff_factor: 2.0,
            retryable_status_codes: [408, 429, 500, 502, 503, 504].into_iter().collect(),
            timeout_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Whether this kind of failure may be retried at all (ignoring budget).
    ///
    /// Status failures must be listed in `retryable_status_codes`; timeouts and
    /// transport failures are always eligible; anything else is not.
    pub fn is_retryable(&self, failure: &Failure) -> bool {
        match failure {
            Failure::Status { code, .. } => self.retryable_status_codes.contains(code),
            Failure::TimedOut | Failure::Transport(_) => true,
            Failure::Other(_) => false,
        }
    }

    /// Deterministic part of the delay before retry number `attempt + 1`.
    ///
    /// `attempt` is 0-based: `min(base * factor^attempt, max)`.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let raw = self.base_delay_ms as f64 * self.backoff_factor.powi(exp);
        let max = self.max_delay_ms as f64;
        let capped = if raw.is_finite() && raw >= 0.0 {
            raw.min(max)
        } else {
            max
        };
        Duration::from_millis(capped as u64)
    }

    /// Decide whether attempt `attempt` (0-based) should be followed by another.
    ///
    /// `budget` is the effective retry budget (a per-call override or
    /// `max_retries`); `jitter` is added on top of the backoff.
    pub fn decide(
        &self,
        attempt: u32,
        budget: u32,
        failure: &Failure,
        jitter: Duration,
    ) -> RetryDecision {
        if !self.enable_retry || attempt >= budget || !self.is_retryable(failure) {
            return RetryDecision::NoRetry;
        }
        RetryDecision::RetryAfter(self.backoff(attempt) + jitter)
    }
}

/// Random jitter in `[0, JITTER_CEILING_MS)` milliseconds.
pub fn jitter() -> Duration {
    Duration::from_millis(rand::thread_rng().gen_range(0..JITTER_CEILING_MS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let p = RetryPolicy::default();
        assert!(p.enable_retry);
        assert_eq!(p.max_retries, 3);
        assert_eq!(p.base_delay_ms, 1000);
        assert_eq!(p.max_delay_ms, 30_000);
        assert!((p.backoff_factor - 2.0).abs() < f64::EPSILON);
        assert_eq!(
            p.retryable_status_codes.iter().copied().collect::<Vec<_>>(),
            vec![408, 429, 500, 502, 503, 504]
        );
    }

    #[test]
    fn exponential_backoff_grows_and_is_capped() {
        let p = RetryPolicy::default();
        assert_eq!(p.backoff(0), Duration::from_millis(1000));
        assert_eq!(p.backoff(1), Duration::from_millis(2000));
        assert_eq!(p.backoff(2), Duration::from_millis(4000));
        assert_eq!(p.backoff(5), Duration::from_millis(30_000));
        assert_eq!(p.backoff(500), Duration::from_millis(30_000));
    }

    #[test]
    fn jitter_stays_under_ceiling() {
        for _ in 0..200 {
            assert!(jitter() < Duration::from_millis(JITTER_CEILING_MS));
        }
    }

    #[test]
    fn decide_adds_jitter_to_backoff() {
        let p = RetryPolicy::default();
        let failure = Failure::status(503, "Service Unavailable");
        assert_eq!(
            p.decide(1, 3, &failure, Duration::from_millis(250)),
            RetryDecision::RetryAfter(Duration::from_millis(2250))
        );
    }

    #[test]
    fn respects_budget() {
        let p = RetryPolicy::default();
        let failure = Failure::status(500, "Internal Server Error");
        assert!(matches!(
            p.decide(2, 3, &failure, Duration::ZERO),
            RetryDecision::RetryAfter(_)
        ));
        assert_eq!(p.decide(3, 3, &failure, Duration::ZERO), RetryDecision::NoRetry);
        assert_eq!(p.decide(0, 0, &failure, Duration::ZERO), RetryDecision::NoRetry);
    }

    #[test]
    fn no_retry_for_unlisted_status_or_unknown_failure() {
        let p = RetryPolicy::default();
        assert_eq!(
            p.decide(0, 3, &Failure::status(404, "Not Found"), Duration::ZERO),
            RetryDecision::NoRetry
        );
        assert_eq!(
            p.decide(0, 3, &Failure::other("bad input"), Duration::ZERO),
            RetryDecision::NoRetry
        );
        assert!(p.is_retryable(&Failure::TimedOut));
        assert!(p.is_retryable(&Failure::transport("reset")));
    }

    #[test]
    fn master_switch_disables_everything() {
        let p = RetryPolicy {
            enable_retry: false,
            ..RetryPolicy::default()
        };
        assert_eq!(p.decide(0, 3, &Failure::TimedOut, Duration::ZERO), RetryDecision::NoRetry);
    }
}
