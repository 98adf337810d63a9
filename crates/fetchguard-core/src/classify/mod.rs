//! Failure classification.
//!
//! Maps an HTTP status code, or a non-HTTP failure, to a user-presentable
//! `ErrorDescription`: message, severity, retryability hint, and an optional
//! suggested action. Pure functions, no state.

mod description;
mod table;

use std::collections::HashMap;

use crate::retry::Failure;

pub use description::{ActionTarget, ErrorDescription, RemedialAction, Severity};

/// Per-deployment message overrides keyed by status code.
pub type CustomMessages = HashMap<u16, String>;

/// Status used for timeouts that never produced a response.
pub const TIMEOUT_STATUS: u16 = 408;

/// Classify an HTTP status code.
///
/// A custom message for the exact code wins; its severity and retryability
/// are then derived from the status range alone. Otherwise the pre-authored
/// table is used, falling back by range for codes it does not list.
pub fn classify(status: u16, custom: &CustomMessages) -> ErrorDescription {
    if let Some(message) = custom.get(&status) {
        return ErrorDescription {
            status_code: status,
            user_message: message.clone(),
            severity: Severity::from_status_range(status),
            can_retry: status >= 500 || status == 408 || status == 429,
            hint: None,
            action: None,
        };
    }

    if let Some(entry) = table::status_entry(status) {
        return entry.describe(status);
    }

    match status {
        500..=u16::MAX => table::SERVER_FALLBACK.describe(status),
        400..=499 => table::CLIENT_FALLBACK.describe(status),
        _ => table::UNKNOWN_ERROR.describe(status),
    }
}

/// Classify a failure that did not come with a usable response.
///
/// Timeouts map to 408; transport failures and anything else map to 0.
/// A `Status` failure passed here is described by its code without overrides.
pub fn classify_exception(failure: &Failure) -> ErrorDescription {
    match failure {
        Failure::TimedOut => table::TIMEOUT_ERROR.describe(TIMEOUT_STATUS),
        Failure::Transport(_) => table::NETWORK_ERROR.describe(0),
        Failure::Other(_) => table::UNKNOWN_ERROR.describe(0),
        Failure::Status { code, .. } => classify(*code, &CustomMessages::new()),
    }
}

/// Classify any attempt failure, applying custom messages to status failures.
pub fn classify_failure(failure: &Failure, custom: &CustomMessages) -> ErrorDescription {
    match failure {
        Failure::Status { code, .. } => classify(*code, custom),
        other => classify_exception(other),
    }
}
