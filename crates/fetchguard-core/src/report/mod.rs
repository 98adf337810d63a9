//! Terminal-failure reporting.
//!
//! The executor hands every terminal failure to a `Reporter`, which drops
//! duplicates inside the throttle window and forwards the rest to the
//! caller-supplied `NotificationSink`. Non-network code reports through a
//! `ManualReporter` handle that shares the same sink.

mod dedup;
mod manual;

use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::classify::ErrorDescription;
use crate::retry::{Failure, SettingsCell};

pub use dedup::{DedupKey, DedupWindow, EXPIRY_FACTOR};
pub use manual::ManualReporter;

/// A terminal failure, ready for presentation.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorContext {
    #[serde(flatten)]
    pub description: ErrorDescription,
    /// Raw text of the underlying failure.
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub url: String,
    pub method: String,
    /// Retries already made before giving up (0 = failed on the first try).
    pub retry_count: u32,
    #[serde(skip)]
    pub original_error: Option<Failure>,
}

impl ErrorContext {
    pub fn new(
        description: ErrorDescription,
        message: impl Into<String>,
        url: impl Into<String>,
        method: impl Into<String>,
        retry_count: u32,
    ) -> Self {
        Self {
            description,
            message: message.into(),
            timestamp: Utc::now(),
            url: url.into(),
            method: method.into(),
            retry_count,
            original_error: None,
        }
    }

    pub fn with_original_error(mut self, failure: Failure) -> Self {
        self.original_error = Some(failure);
        self
    }

    pub fn status_code(&self) -> u16 {
        self.description.status_code
    }

    pub fn user_message(&self) -> &str {
        &self.description.user_message
    }

    pub fn dedup_key(&self) -> DedupKey {
        DedupKey {
            status_code: self.description.status_code,
            url: self.url.clone(),
            method: self.method.clone(),
        }
    }
}

/// Receiver of user-facing failure notifications (e.g. a toast layer).
///
/// Called synchronously from the retry loop; implementations should return
/// quickly. A panicking sink is caught and logged.
pub trait NotificationSink: Send + Sync {
    fn notify(&self, context: &ErrorContext);
}

impl<F> NotificationSink for F
where
    F: Fn(&ErrorContext) + Send + Sync,
{
    fn notify(&self, context: &ErrorContext) {
        self(context)
    }
}

/// Shared front door to the notification sink.
#[derive(Clone)]
pub struct Reporter {
    settings: SettingsCell,
    window: Arc<Mutex<DedupWindow>>,
    sink: Arc<dyn NotificationSink>,
}

impl std::fmt::Debug for Reporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reporter")
            .field("window", &self.window)
            .finish_non_exhaustive()
    }
}

impl Reporter {
    pub fn new(settings: SettingsCell, sink: Arc<dyn NotificationSink>) -> Self {
        let throttle = settings.read(|s| s.throttle);
        Self {
            settings,
            window: Arc::new(Mutex::new(DedupWindow::new(throttle))),
            sink,
        }
    }

    /// Report a terminal failure from the retry loop, subject to dedup.
    /// Only admitted contexts are logged in debug mode. Returns true if the
    /// sink was invoked.
    pub fn report(&self, context: &ErrorContext) -> bool {
        let admitted = self
            .window
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .admit(context.dedup_key(), tokio::time::Instant::now());
        if !admitted {
            tracing::debug!(
                status = context.status_code(),
                url = %context.url,
                method = %context.method,
                "duplicate failure notification suppressed"
            );
            return false;
        }
        let (show, debug) = self.settings.read(|s| (s.show_notifications, s.debug_mode));
        if debug {
            debug_log(context, "retry");
        }
        if !show {
            return false;
        }
        self.deliver(context);
        true
    }

    /// Forward an out-of-band context straight to the sink (no dedup).
    pub fn report_manual(&self, context: &ErrorContext) -> bool {
        let (show, debug) = self.settings.read(|s| (s.show_notifications, s.debug_mode));
        if debug {
            debug_log(context, "manual");
        }
        if !show {
            return false;
        }
        self.deliver(context);
        true
    }

    /// Handle for non-network code to raise reports through this reporter.
    pub fn manual(&self) -> ManualReporter {
        ManualReporter::new(self.clone())
    }

    pub(crate) fn settings(&self) -> &SettingsCell {
        &self.settings
    }

    /// Number of keys currently remembered by the dedup window.
    pub fn tracked_keys(&self) -> usize {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Forget all remembered keys.
    pub fn shutdown(&self) {
        self.window.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }

    fn deliver(&self, context: &ErrorContext) {
        let sink = Arc::clone(&self.sink);
        if panic::catch_unwind(AssertUnwindSafe(|| sink.notify(context))).is_err() {
            tracing::error!(
                status = context.status_code(),
                url = %context.url,
                "notification sink panicked"
            );
        }
    }
}

/// Full context as one JSON log line.
fn debug_log(context: &ErrorContext, source: &'static str) {
    match serde_json::to_string(context) {
        Ok(json) => tracing::warn!(source, context = %json, "http error"),
        Err(_) => tracing::warn!(source, ?context, "http error"),
    }
}
