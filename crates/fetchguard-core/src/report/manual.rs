//! Out-of-band reporting for failures that did not come from a request
//! (hand-written validation, background jobs, ...).

use super::{ErrorContext, Reporter};
use crate::classify::classify;

/// Cloneable handle that injects contexts into the notification path.
#[derive(Debug, Clone)]
pub struct ManualReporter {
    reporter: Reporter,
}

impl ManualReporter {
    pub(super) fn new(reporter: Reporter) -> Self {
        Self { reporter }
    }

    /// Classify `status` with the live custom messages and report it.
    /// Returns the context that was built, whether or not it was shown.
    pub fn report(
        &self,
        status: u16,
        message: impl Into<String>,
        url: impl Into<String>,
        method: impl Into<String>,
    ) -> ErrorContext {
        let description = self
            .reporter
            .settings()
            .read(|s| classify(status, &s.custom_messages));
        let context = ErrorContext::new(description, message, url, method, 0);
        self.reporter.report_manual(&context);
        context
    }

    /// Report a context built elsewhere.
    pub fn report_context(&self, context: &ErrorContext) -> bool {
        self.reporter.report_manual(context)
    }
}
