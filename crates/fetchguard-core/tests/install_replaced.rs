//! Disposing after the default issuer was replaced leaves the replacement.
//!
//! The default issuer is global, so this runs in its own test binary.

mod common;

use std::sync::Arc;

use common::scripted::{ScriptedIssuer, Step};
use fetchguard_core::issuer::{self, Issuer};
use fetchguard_core::retry::{RetryPolicy, RetryingExecutor};

#[test]
fn dispose_keeps_a_default_set_after_install() {
    let original: Arc<dyn Issuer> = Arc::new(ScriptedIssuer::new([Step::Reply(200)]));
    let replacement: Arc<dyn Issuer> = Arc::new(ScriptedIssuer::new([Step::Reply(204)]));
    issuer::set_default_issuer(Arc::clone(&original));

    let (_seen, sink) = common::recording_sink();
    let exec = Arc::new(RetryingExecutor::with_policy(RetryPolicy::default(), sink));
    assert!(exec.install());
    assert!(issuer::default_issuer().is_guarded());

    issuer::set_default_issuer(Arc::clone(&replacement));
    assert!(exec.dispose());

    let current = issuer::default_issuer();
    assert!(Arc::ptr_eq(&current, &replacement));
    assert!(!Arc::ptr_eq(&current, &original));
    assert_eq!(issuer::installed_count(), 0);
}
