//! Retry loop: run an attempt until success or the live policy says stop.

use std::future::Future;
use std::time::Duration;

use super::error::Failure;
use super::policy::{jitter, RetryDecision};
use super::settings::SettingsCell;
use super::RequestOptions;
use crate::control::AbortSignal;
use crate::issuer::ResponseLike;

/// Why the loop stopped without a successful response.
#[derive(Debug)]
pub(super) struct Exhausted {
    pub(super) failure: Failure,
    /// Retries made before giving up (0-based attempt index of the last try).
    pub(super) retry_count: u32,
}

/// Runs `issue` until it yields a successful response or the policy says to
/// stop. Each attempt races a deadline; on expiry the attempt's signal is
/// raised and the attempt counts as `Failure::TimedOut`. On a retryable
/// failure, sleeps for backoff plus jitter and tries again.
///
/// The policy is read from `settings` at every attempt and every decision,
/// so updates land in loops that are already running. Attempt signals are
/// children of `call`; once `call` is aborted no further attempt is made.
pub(super) async fn run_with_retry<R, F, Fut>(
    settings: &SettingsCell,
    options: &RequestOptions,
    call: &AbortSignal,
    target: &str,
    method: &str,
    mut issue: F,
) -> Result<R, Exhausted>
where
    R: ResponseLike,
    F: FnMut(AbortSignal) -> Fut,
    Fut: Future<Output = Result<R, Failure>>,
{
    let mut attempt = 0u32;
    loop {
        let timeout = options
            .timeout_ms
            .map(Duration::from_millis)
            .unwrap_or_else(|| settings.read(|s| s.policy.timeout()));
        let signal = call.child();
        let failure = match run_attempt(issue(signal.clone()), &signal, timeout).await {
            Ok(response) => {
                if attempt > 0 {
                    tracing::debug!(url = %target, method, retries = attempt, "request succeeded after retry");
                }
                return Ok(response);
            }
            Err(failure) => failure,
        };

        if call.is_aborted() {
            return Err(Exhausted {
                failure,
                retry_count: attempt,
            });
        }

        let policy = settings.policy();
        let budget = options.max_retries.unwrap_or(policy.max_retries);
        match policy.decide(attempt, budget, &failure, jitter()) {
            RetryDecision::NoRetry => {
                return Err(Exhausted {
                    failure,
                    retry_count: attempt,
                })
            }
            RetryDecision::RetryAfter(delay) => {
                tracing::debug!(
                    url = %target,
                    method,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %failure,
                    "retrying request"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// One attempt under a deadline. Non-success responses become `Failure::Status`.
async fn run_attempt<R, Fut>(fut: Fut, signal: &AbortSignal, timeout: Duration) -> Result<R, Failure>
where
    R: ResponseLike,
    Fut: Future<Output = Result<R, Failure>>,
{
    let mut guard = AbortOnDrop {
        signal,
        settled: false,
    };
    let outcome = tokio::time::timeout(timeout, fut).await;
    guard.settled = true;
    match outcome {
        Ok(Ok(response)) if response.is_success() => Ok(response),
        Ok(Ok(response)) => Err(Failure::status(response.status(), response.reason())),
        Ok(Err(failure)) => Err(failure),
        Err(_elapsed) => {
            signal.abort();
            Err(Failure::TimedOut)
        }
    }
}

/// Raises the attempt's signal if the attempt is dropped before it settles,
/// e.g. when the caller drops the whole call.
struct AbortOnDrop<'a> {
    signal: &'a AbortSignal,
    settled: bool,
}

impl Drop for AbortOnDrop<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.signal.abort();
        }
    }
}
