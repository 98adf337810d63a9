//! Attempt cancellation: shared abort tokens.
//!
//! Every attempt gets its own `AbortSignal`, a child of the call's signal.
//! The executor raises it when the attempt's deadline passes or when the
//! attempt is dropped unfinished; the transport (e.g. the curl progress
//! callback) checks it and stops the in-flight transfer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Error returned by a transport that stopped because its signal was raised.
#[derive(Debug, thiserror::Error)]
#[error("request aborted")]
pub struct Aborted;

/// Cloneable abort token. All clones observe the same flag.
///
/// A child signal also reports aborted once any ancestor is aborted;
/// aborting a child leaves its parent untouched.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal {
    flag: Arc<AtomicBool>,
    parent: Option<Box<AbortSignal>>,
}

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request that the operation holding this signal stop.
    pub fn abort(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// New signal that follows this one.
    pub fn child(&self) -> Self {
        Self {
            flag: Arc::default(),
            parent: Some(Box::new(self.clone())),
        }
    }

    pub fn is_aborted(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
            || self.parent.as_ref().is_some_and(|p| p.is_aborted())
    }
}
