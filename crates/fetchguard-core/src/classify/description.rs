//! User-facing error descriptions produced by the classifier.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How loudly a failure should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
    Critical,
}

impl Severity {
    /// Severity derived purely from the status range (used for custom messages).
    pub fn from_status_range(status: u16) -> Self {
        if status >= 500 {
            Severity::Error
        } else if status >= 400 {
            Severity::Warning
        } else {
            Severity::Info
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// What the suggested action does when the user picks it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "path", rename_all = "snake_case")]
pub enum ActionTarget {
    /// Navigate to an application route.
    Navigate(String),
    /// Issue the failed request again.
    Reissue,
    /// Reload the current view.
    Refresh,
    /// Return to the previous view.
    GoBack,
}

/// A single suggested remedial action ("Sign In", "Retry", ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemedialAction {
    pub label: String,
    pub target: ActionTarget,
}

impl RemedialAction {
    pub fn new(label: impl Into<String>, target: ActionTarget) -> Self {
        Self {
            label: label.into(),
            target,
        }
    }
}

/// Classification of one failure. Built fresh per call and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDescription {
    /// HTTP status; 0 for failures that never produced a response.
    pub status_code: u16,
    pub user_message: String,
    pub severity: Severity,
    /// Policy hint. Says nothing about whether a retry was attempted.
    pub can_retry: bool,
    /// Short guidance shown next to the message, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RemedialAction>,
}

impl ErrorDescription {
    /// Short heading for the failure, by status range.
    pub fn title(&self) -> &'static str {
        match self.status_code {
            500..=u16::MAX => "Server Error",
            400..=499 => "Request Error",
            0 => "Network Error",
            _ => "Error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_from_range() {
        assert_eq!(Severity::from_status_range(503), Severity::Error);
        assert_eq!(Severity::from_status_range(418), Severity::Warning);
        assert_eq!(Severity::from_status_range(302), Severity::Info);
        assert_eq!(Severity::from_status_range(0), Severity::Info);
    }

    #[test]
    fn titles_follow_status_range() {
        let mut d = ErrorDescription {
            status_code: 502,
            user_message: String::new(),
            severity: Severity::Error,
            can_retry: true,
            hint: None,
            action: None,
        };
        assert_eq!(d.title(), "Server Error");
        d.status_code = 404;
        assert_eq!(d.title(), "Request Error");
        d.status_code = 0;
        assert_eq!(d.title(), "Network Error");
        d.status_code = 301;
        assert_eq!(d.title(), "Error");
    }
}
