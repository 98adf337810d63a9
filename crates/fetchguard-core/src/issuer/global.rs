//! Process-wide default issuer and its reversible interception.
//!
//! Code that cannot take an injected issuer uses `default_issuer()`. A
//! `RetryingExecutor` can wrap the current default in a `GuardedIssuer` so
//! those call sites get retries and reporting too. The original is handed
//! back to the executor and put back verbatim on dispose, unless the default
//! was replaced in the meantime.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, Weak};

use async_trait::async_trait;

use super::{CurlIssuer, Issuer, Request, Response};
use crate::control::AbortSignal;
use crate::retry::{Failure, RetryingExecutor};

static DEFAULT_ISSUER: RwLock<Option<Arc<dyn Issuer>>> = RwLock::new(None);

/// Executors currently intercepting the default issuer (0 or 1).
static INSTALLED: AtomicUsize = AtomicUsize::new(0);

/// The current process-wide issuer. A `CurlIssuer` is created on first use.
pub fn default_issuer() -> Arc<dyn Issuer> {
    if let Some(issuer) = DEFAULT_ISSUER
        .read()
        .unwrap_or_else(PoisonError::into_inner)
        .as_ref()
    {
        return Arc::clone(issuer);
    }
    let mut slot = DEFAULT_ISSUER.write().unwrap_or_else(PoisonError::into_inner);
    Arc::clone(slot.get_or_insert_with(|| Arc::new(CurlIssuer::default())))
}

/// Replace the process-wide issuer, returning the previous one.
pub fn set_default_issuer(issuer: Arc<dyn Issuer>) -> Arc<dyn Issuer> {
    let mut slot = DEFAULT_ISSUER.write().unwrap_or_else(PoisonError::into_inner);
    slot.replace(issuer)
        .unwrap_or_else(|| Arc::new(CurlIssuer::default()))
}

pub fn installed_count() -> usize {
    INSTALLED.load(Ordering::Acquire)
}

/// What `guard_default` swapped: the issuer it replaced and the guard it put
/// in its place. The guard owns the executor, so it is held weakly here.
pub(crate) struct Interception {
    original: Arc<dyn Issuer>,
    guard: Weak<dyn Issuer>,
}

/// Wrap the current default in a guard owned by `executor`.
///
/// Returns `None` if the default is already guarded (no double wrapping).
pub(crate) fn guard_default(executor: Arc<RetryingExecutor>) -> Option<Interception> {
    let mut slot = DEFAULT_ISSUER.write().unwrap_or_else(PoisonError::into_inner);
    let current = Arc::clone(slot.get_or_insert_with(|| Arc::new(CurlIssuer::default())));
    if current.is_guarded() {
        return None;
    }
    let guard: Arc<dyn Issuer> = Arc::new(GuardedIssuer {
        executor,
        inner: Arc::clone(&current),
    });
    *slot = Some(Arc::clone(&guard));
    INSTALLED.fetch_add(1, Ordering::AcqRel);
    Some(Interception {
        original: current,
        guard: Arc::downgrade(&guard),
    })
}

/// Undo `guard_default`. The original goes back only if the slot still holds
/// this interception's guard; a default set since then is left alone.
/// Returns true if the original was put back.
pub(crate) fn restore_default(interception: Interception) -> bool {
    let mut slot = DEFAULT_ISSUER.write().unwrap_or_else(PoisonError::into_inner);
    let _ = INSTALLED.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    let still_ours = slot
        .as_ref()
        .is_some_and(|current| Weak::ptr_eq(&Arc::downgrade(current), &interception.guard));
    if still_ours {
        *slot = Some(interception.original);
    }
    still_ours
}

/// Issuer that routes every request through a retrying executor.
///
/// Once the executor is disposed, requests pass straight to the wrapped
/// issuer, so stale clones stop being intercepted.
pub struct GuardedIssuer {
    executor: Arc<RetryingExecutor>,
    inner: Arc<dyn Issuer>,
}

impl GuardedIssuer {
    pub fn inner(&self) -> &Arc<dyn Issuer> {
        &self.inner
    }
}

#[async_trait]
impl Issuer for GuardedIssuer {
    async fn issue(&self, request: &Request, abort: AbortSignal) -> Result<Response, Failure> {
        if self.executor.is_disposed() {
            return self.inner.issue(request, abort).await;
        }
        self.executor
            .fetch_with_signal(self.inner.as_ref(), request, &abort)
            .await
            .map_err(|e| e.failure)
    }

    fn is_guarded(&self) -> bool {
        true
    }
}
