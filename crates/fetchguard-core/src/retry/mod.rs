//! Retry and backoff engine.
//!
//! This module holds the failure taxonomy, the hot-swappable retry policy,
//! the retry loop itself, and `RetryingExecutor`, which ties the loop to
//! classification and reporting.

mod error;
mod executor;
mod policy;
mod run;
mod settings;

pub use error::{BoxError, Failure, FailureKind, RequestError, SharedError};
pub use executor::{RequestOptions, RetryingExecutor};
pub use policy::{jitter, RetryDecision, RetryPolicy, JITTER_CEILING_MS};
pub use settings::{HandlerSettings, PolicyUpdate, SettingsCell, DEFAULT_THROTTLE_MS};
