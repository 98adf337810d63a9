pub mod classify;
pub mod config;
pub mod control;
pub mod issuer;
pub mod logging;
pub mod report;
pub mod retry;

pub use classify::{classify, classify_exception, ErrorDescription, Severity};
pub use issuer::{Issuer, Request, Response, ResponseLike};
pub use report::{ErrorContext, ManualReporter, NotificationSink};
pub use retry::{Failure, PolicyUpdate, RequestError, RequestOptions, RetryPolicy, RetryingExecutor};
