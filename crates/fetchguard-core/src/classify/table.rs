//! Pre-authored copy for known status codes and non-HTTP failures.
//!
//! This table is the only place user-facing messages and retryability
//! defaults live. Everything else looks them up here.

use super::description::{ActionTarget, ErrorDescription, RemedialAction, Severity};
use EntryAction::{GoBack, Navigate, Refresh, Reissue};
use Severity::{Error, Info, Warning};

/// Action an entry suggests. `Navigate` carries an application route.
#[derive(Debug, Clone, Copy)]
pub(super) enum EntryAction {
    Navigate(&'static str, &'static str),
    Reissue(&'static str),
    Refresh(&'static str),
    GoBack(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub(super) struct Entry {
    pub(super) message: &'static str,
    pub(super) severity: Severity,
    pub(super) can_retry: bool,
    pub(super) hint: Option<&'static str>,
    pub(super) action: Option<EntryAction>,
}

impl Entry {
    const fn new(message: &'static str, severity: Severity, can_retry: bool) -> Self {
        Self {
            message,
            severity,
            can_retry,
            hint: None,
            action: None,
        }
    }

    const fn hint(self, hint: &'static str) -> Self {
        Self {
            hint: Some(hint),
            ..self
        }
    }

    const fn action(self, action: EntryAction) -> Self {
        Self {
            action: Some(action),
            ..self
        }
    }

    pub(super) fn describe(&self, status_code: u16) -> ErrorDescription {
        let action = self.action.map(|a| match a {
            EntryAction::Navigate(label, path) => {
                RemedialAction::new(label, ActionTarget::Navigate(path.to_string()))
            }
            EntryAction::Reissue(label) => RemedialAction::new(label, ActionTarget::Reissue),
            EntryAction::Refresh(label) => RemedialAction::new(label, ActionTarget::Refresh),
            EntryAction::GoBack(label) => RemedialAction::new(label, ActionTarget::GoBack),
        });
        ErrorDescription {
            status_code,
            user_message: self.message.to_string(),
            severity: self.severity,
            can_retry: self.can_retry,
            hint: self.hint.map(str::to_string),
            action,
        }
    }
}

/// Look up the pre-authored entry for a status code.
pub(super) fn status_entry(code: u16) -> Option<Entry> {
    let entry = match code {
        100 => Entry::new("Request is being processed...", Info, false),
        200 => Entry::new("Request completed successfully", Info, false),
        301 => Entry::new("The resource has moved permanently", Info, false),
        302 => Entry::new("The resource has moved temporarily", Info, false),

        400 => Entry::new(
            "The information you provided is invalid. Please check and try again.",
            Error,
            false,
        )
        .hint("Review your input for any errors"),
        401 => Entry::new("You need to log in to access this resource.", Warning, false)
            .hint("Please sign in to continue")
            .action(Navigate("Sign In", "/login")),
        403 => Entry::new("You don't have permission to perform this action.", Error, false)
            .hint("Contact support if you believe this is an error")
            .action(Navigate("Contact Support", "/support")),
        404 => Entry::new("The requested resource could not be found.", Error, false)
            .hint("Check the URL or navigate from the home page")
            .action(Navigate("Go Home", "/")),
        405 => Entry::new("This action is not allowed for this resource.", Error, false),
        408 => Entry::new("The request took too long to complete.", Warning, true)
            .hint("Please try again")
            .action(Reissue("Retry")),
        409 => Entry::new("There was a conflict with your request.", Error, false)
            .hint("Please refresh the page and try again")
            .action(Refresh("Refresh")),
        410 => Entry::new("This resource is no longer available.", Error, false)
            .action(GoBack("Go Back")),
        422 => Entry::new("The data you provided could not be processed.", Error, false)
            .hint("Please check your input and try again"),
        429 => Entry::new(
            "You're making requests too quickly. Please slow down.",
            Warning,
            true,
        )
        .hint("Wait a moment before trying again")
        .action(Reissue("Try Again")),

        500 => Entry::new("Something went wrong on our servers.", Error, true)
            .hint("Please try again in a moment")
            .action(Reissue("Retry")),
        501 => Entry::new("This feature is not yet available.", Error, false),
        502 => Entry::new("Our service is temporarily unavailable.", Error, true)
            .hint("Please try again")
            .action(Reissue("Retry")),
        503 => Entry::new("Our service is temporarily down for maintenance.", Error, true)
            .hint("Please try again in a few minutes")
            .action(Reissue("Retry")),
        504 => Entry::new("The server took too long to respond.", Warning, true)
            .hint("Please try again")
            .action(Reissue("Retry")),
        _ => return None,
    };
    Some(entry)
}

pub(super) const SERVER_FALLBACK: Entry =
    Entry::new("Server error occurred. Please try again later", Error, true);

pub(super) const CLIENT_FALLBACK: Entry = Entry::new(
    "Request failed. Please check your input and try again",
    Error,
    false,
);

pub(super) const NETWORK_ERROR: Entry = Entry::new(
    "Unable to connect to the server. Please check your internet connection.",
    Error,
    true,
)
.hint("Verify your internet connection is stable")
.action(Reissue("Retry"));

pub(super) const TIMEOUT_ERROR: Entry =
    Entry::new("The request timed out. Please try again.", Warning, true)
        .hint("Check your connection speed")
        .action(Reissue("Retry"));

pub(super) const UNKNOWN_ERROR: Entry = Entry::new(
    "An unexpected error occurred. Please try again.",
    Error,
    true,
)
.action(Reissue("Retry"));
