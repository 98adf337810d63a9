//! The retrying request executor.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use super::error::{Failure, FailureKind, RequestError};
use super::policy::RetryPolicy;
use super::run::{run_with_retry, Exhausted};
use super::settings::{HandlerSettings, PolicyUpdate, SettingsCell};
use crate::classify::classify_failure;
use crate::control::AbortSignal;
use crate::issuer::{self, Interception, Issuer, Request, Response, ResponseLike};
use crate::report::{ErrorContext, ManualReporter, NotificationSink, Reporter};

/// Per-call overrides.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestOptions {
    /// Per-attempt deadline; the policy's `timeout_ms` when `None`.
    pub timeout_ms: Option<u64>,
    /// Retry budget for this call; the live `max_retries` when `None`.
    pub max_retries: Option<u32>,
    /// Issue exactly once with no deadline, retry, classification or
    /// notification. The raw response is returned whatever its status.
    pub skip_error_handler: bool,
}

/// Wraps a request-issuing function with deadlines, retries with backoff,
/// failure classification and deduplicated notifications.
///
/// Concurrent `execute` calls run independent loops. They share only the live
/// settings and the reporter's dedup window.
pub struct RetryingExecutor {
    settings: SettingsCell,
    reporter: Reporter,
    /// Default issuer swap made by `install`.
    installed: Mutex<Option<Interception>>,
    disposed: AtomicBool,
}

impl std::fmt::Debug for RetryingExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryingExecutor")
            .field("settings", &self.settings)
            .field("disposed", &self.is_disposed())
            .finish_non_exhaustive()
    }
}

impl RetryingExecutor {
    pub fn new(settings: HandlerSettings, sink: Arc<dyn NotificationSink>) -> Self {
        let settings = SettingsCell::new(settings);
        let reporter = Reporter::new(settings.clone(), sink);
        Self {
            settings,
            reporter,
            installed: Mutex::new(None),
            disposed: AtomicBool::new(false),
        }
    }

    /// Executor with default notification flags and the given policy.
    pub fn with_policy(policy: RetryPolicy, sink: Arc<dyn NotificationSink>) -> Self {
        Self::new(
            HandlerSettings {
                policy,
                ..HandlerSettings::default()
            },
            sink,
        )
    }

    /// Run `issue` under the retry loop.
    ///
    /// `issue` is called once per attempt with that attempt's abort signal.
    /// The first successful response is returned as is. A terminal failure is
    /// classified, reported (subject to dedup) and returned as `RequestError`
    /// with the exact failure of the last attempt. Dropping the returned
    /// future raises the signal of the attempt in flight.
    pub async fn execute<R, F, Fut>(
        &self,
        target: &str,
        method: &str,
        options: &RequestOptions,
        issue: F,
    ) -> Result<R, RequestError>
    where
        R: ResponseLike,
        F: FnMut(AbortSignal) -> Fut,
        Fut: Future<Output = Result<R, Failure>>,
    {
        self.execute_linked(&AbortSignal::new(), target, method, options, issue)
            .await
    }

    async fn execute_linked<R, F, Fut>(
        &self,
        call: &AbortSignal,
        target: &str,
        method: &str,
        options: &RequestOptions,
        issue: F,
    ) -> Result<R, RequestError>
    where
        R: ResponseLike,
        F: FnMut(AbortSignal) -> Fut,
        Fut: Future<Output = Result<R, Failure>>,
    {
        match run_with_retry(&self.settings, options, call, target, method, issue).await {
            Ok(response) => Ok(response),
            Err(Exhausted {
                failure,
                retry_count,
            }) => Err(self.terminal(failure, target, method, retry_count)),
        }
    }

    /// Issue `request` through `issuer`, honouring `request.options`.
    pub async fn fetch(
        &self,
        issuer: &dyn Issuer,
        request: &Request,
    ) -> Result<Response, RequestError> {
        self.fetch_with_signal(issuer, request, &AbortSignal::new())
            .await
    }

    /// Like `fetch`, with every attempt signal a child of `call`: aborting
    /// `call` aborts the attempt in flight and stops further retries.
    pub async fn fetch_with_signal(
        &self,
        issuer: &dyn Issuer,
        request: &Request,
        call: &AbortSignal,
    ) -> Result<Response, RequestError> {
        if request.options.skip_error_handler {
            return issuer
                .issue(request, call.clone())
                .await
                .map_err(|failure| self.unreported(failure, request));
        }
        self.execute_linked(call, &request.url, &request.method, &request.options, |signal| {
            issuer.issue(request, signal)
        })
        .await
    }

    /// Merge a partial update into the live settings. In-flight loops see it
    /// at their next decision point.
    pub fn update_policy(&self, update: PolicyUpdate) {
        self.settings.update(update);
        tracing::debug!(policy = ?self.settings.policy(), "retry policy updated");
    }

    pub fn current_policy(&self) -> RetryPolicy {
        self.settings.policy()
    }

    pub fn settings(&self) -> HandlerSettings {
        self.settings.snapshot()
    }

    pub fn reporter(&self) -> &Reporter {
        &self.reporter
    }

    pub fn manual_reporter(&self) -> ManualReporter {
        self.reporter.manual()
    }

    /// Make this executor intercept the process-wide default issuer.
    ///
    /// Returns false without changing anything if this executor is already
    /// installed or disposed, or if the current default is already guarded.
    pub fn install(self: &Arc<Self>) -> bool {
        if self.is_disposed() {
            return false;
        }
        let mut installed = self.installed.lock().unwrap_or_else(PoisonError::into_inner);
        if installed.is_some() {
            return false;
        }
        match issuer::guard_default(Arc::clone(self)) {
            Some(interception) => {
                *installed = Some(interception);
                tracing::debug!("default issuer intercepted");
                true
            }
            None => false,
        }
    }

    /// Stop intercepting: restore the default issuer that was current at
    /// install time (unless the default has been replaced since) and forget
    /// the dedup window. Loops already running are
    /// not cancelled. Returns false if there was nothing to undo.
    pub fn dispose(&self) -> bool {
        let was_disposed = self.disposed.swap(true, Ordering::AcqRel);
        let interception = self
            .installed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(interception) = interception {
            if issuer::restore_default(interception) {
                tracing::debug!("default issuer restored");
            } else {
                tracing::debug!("default issuer replaced since install, left as is");
            }
        }
        if !was_disposed {
            self.reporter.shutdown();
        }
        !was_disposed
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    fn context_for(&self, failure: &Failure, target: &str, method: &str, retry_count: u32) -> ErrorContext {
        let description = self
            .settings
            .read(|s| classify_failure(failure, &s.custom_messages));
        let context = ErrorContext::new(description, failure.to_string(), target, method, retry_count);
        if failure.kind() == FailureKind::Status {
            context
        } else {
            context.with_original_error(failure.clone())
        }
    }

    fn terminal(&self, failure: Failure, target: &str, method: &str, retry_count: u32) -> RequestError {
        let context = self.context_for(&failure, target, method, retry_count);
        tracing::warn!(
            url = %target,
            method,
            status = context.status_code(),
            retries = retry_count,
            error = %failure,
            "request failed"
        );
        self.reporter.report(&context);
        RequestError { failure, context }
    }

    fn unreported(&self, failure: Failure, request: &Request) -> RequestError {
        let context = self.context_for(&failure, &request.url, &request.method, 0);
        RequestError { failure, context }
    }
}
