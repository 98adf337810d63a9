//! Failure taxonomy for one attempt and the terminal error handed to callers.

use std::sync::Arc;

use crate::report::ErrorContext;

/// Boxed error accepted by the `Failure` constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Shared source error carried by transport-level failures.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Outcome of a failed attempt, tagged by the layer that produced it.
///
/// Issuers report `Transport` / `Other` (and `TimedOut` when the transport
/// enforces its own deadline); the executor produces `Status` for responses
/// that fail the success predicate and `TimedOut` when the attempt deadline
/// passes first.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Failure {
    /// Response arrived with a non-success status.
    #[error("HTTP {code}: {reason}")]
    Status { code: u16, reason: String },
    /// The attempt exceeded its deadline.
    #[error("request timed out")]
    TimedOut,
    /// Connectivity / DNS / TLS failure before any response.
    #[error("transport error: {0}")]
    Transport(#[source] SharedError),
    /// Anything else.
    #[error("{0}")]
    Other(#[source] SharedError),
}

/// Coarse kind of a `Failure`, for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Status,
    Timeout,
    Transport,
    Unknown,
}

impl Failure {
    pub fn status(code: u16, reason: impl Into<String>) -> Self {
        Failure::Status {
            code,
            reason: reason.into(),
        }
    }

    pub fn transport(err: impl Into<BoxError>) -> Self {
        Failure::Transport(Arc::from(err.into()))
    }

    pub fn other(err: impl Into<BoxError>) -> Self {
        Failure::Other(Arc::from(err.into()))
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            Failure::Status { .. } => FailureKind::Status,
            Failure::TimedOut => FailureKind::Timeout,
            Failure::Transport(_) => FailureKind::Transport,
            Failure::Other(_) => FailureKind::Unknown,
        }
    }

    /// HTTP status carried by the failure, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Failure::Status { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Terminal failure returned to the caller once the engine stops retrying.
///
/// `failure` is the exact failure of the last attempt; `context` is the same
/// user-facing context that was offered to the notification sink.
#[derive(Debug, thiserror::Error)]
#[error("{} {} failed after {} retries: {}", .context.method, .context.url, .context.retry_count, .failure)]
pub struct RequestError {
    #[source]
    pub failure: Failure,
    pub context: ErrorContext,
}

impl RequestError {
    pub fn kind(&self) -> FailureKind {
        self.failure.kind()
    }

    /// Status of the failed response; `None` for timeouts and transport errors.
    pub fn status_code(&self) -> Option<u16> {
        self.failure.status_code()
    }
}
