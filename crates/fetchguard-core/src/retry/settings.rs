//! Live handler settings shared by every retry loop and the reporter.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::Deserialize;

use super::policy::RetryPolicy;
use crate::classify::CustomMessages;

/// Default interval during which a reported failure key is not reported again.
pub const DEFAULT_THROTTLE_MS: u64 = 1000;

/// Everything the engine consults at run time.
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerSettings {
    pub policy: RetryPolicy,
    /// When false, terminal failures are still returned to callers but the
    /// notification sink is not invoked.
    pub show_notifications: bool,
    /// Log every reported context in full.
    pub debug_mode: bool,
    pub custom_messages: CustomMessages,
    /// Dedup throttle interval. Fixed once the executor is built.
    pub throttle: Duration,
}

impl Default for HandlerSettings {
    fn default() -> Self {
        Self {
            policy: RetryPolicy::default(),
            show_notifications: true,
            debug_mode: false,
            custom_messages: CustomMessages::new(),
            throttle: Duration::from_millis(DEFAULT_THROTTLE_MS),
        }
    }
}

/// Partial update: every `Some` field replaces the current value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PolicyUpdate {
    pub enable_retry: Option<bool>,
    pub max_retries: Option<u32>,
    pub base_delay_ms: Option<u64>,
    pub max_delay_ms: Option<u64>,
    pub backoff_factor: Option<f64>,
    pub retryable_status_codes: Option<Vec<u16>>,
    pub timeout_ms: Option<u64>,
    pub show_notifications: Option<bool>,
    pub debug_mode: Option<bool>,
    pub custom_messages: Option<CustomMessages>,
}

impl PolicyUpdate {
    pub fn apply(self, settings: &mut HandlerSettings) {
        let policy = &mut settings.policy;
        if let Some(v) = self.enable_retry {
            policy.enable_retry = v;
        }
        if let Some(v) = self.max_retries {
            policy.max_retries = v;
        }
        if let Some(v) = self.base_delay_ms {
            policy.base_delay_ms = v;
        }
        if let Some(v) = self.max_delay_ms {
            policy.max_delay_ms = v;
        }
        if let Some(v) = self.backoff_factor {
            policy.backoff_factor = v;
        }
        if let Some(v) = self.retryable_status_codes {
            policy.retryable_status_codes = v.into_iter().collect();
        }
        if let Some(v) = self.timeout_ms {
            policy.timeout_ms = v;
        }
        if let Some(v) = self.show_notifications {
            settings.show_notifications = v;
        }
        if let Some(v) = self.debug_mode {
            settings.debug_mode = v;
        }
        if let Some(v) = self.custom_messages {
            settings.custom_messages = v;
        }
    }
}

/// Shared, hot-swappable settings cell.
///
/// Readers take a clone of the value they need; writers replace fields under
/// the write lock. No reader holds the lock across an await point.
#[derive(Debug, Clone, Default)]
pub struct SettingsCell {
    inner: Arc<RwLock<HandlerSettings>>,
}

impl SettingsCell {
    pub fn new(settings: HandlerSettings) -> Self {
        Self {
            inner: Arc::new(RwLock::new(settings)),
        }
    }

    /// Snapshot of the full settings.
    pub fn snapshot(&self) -> HandlerSettings {
        self.read(Clone::clone)
    }

    /// Current retry policy.
    pub fn policy(&self) -> RetryPolicy {
        self.read(|s| s.policy.clone())
    }

    /// Run `f` against the current settings under the read lock.
    pub fn read<T>(&self, f: impl FnOnce(&HandlerSettings) -> T) -> T {
        let guard = self.inner.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    pub fn update(&self, update: PolicyUpdate) {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        update.apply(&mut guard);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_update_touches_only_given_fields() {
        let cell = SettingsCell::new(HandlerSettings::default());
        cell.update(PolicyUpdate {
            max_retries: Some(7),
            retryable_status_codes: Some(vec![503]),
            debug_mode: Some(true),
            ..PolicyUpdate::default()
        });
        let s = cell.snapshot();
        assert_eq!(s.policy.max_retries, 7);
        assert_eq!(s.policy.retryable_status_codes.len(), 1);
        assert!(s.policy.retryable_status_codes.contains(&503));
        assert!(s.debug_mode);
        assert_eq!(s.policy.base_delay_ms, 1000);
        assert!(s.show_notifications);
    }

    #[test]
    fn clones_share_state() {
        let cell = SettingsCell::default();
        let other = cell.clone();
        other.update(PolicyUpdate {
            enable_retry: Some(false),
            ..PolicyUpdate::default()
        });
        assert!(!cell.policy().enable_retry);
    }

    #[test]
    fn update_deserializes_from_partial_toml() {
        let update: PolicyUpdate = toml::from_str("max_retries = 1\nshow_notifications = false\n")
            .expect("partial update parses");
        let mut s = HandlerSettings::default();
        update.apply(&mut s);
        assert_eq!(s.policy.max_retries, 1);
        assert!(!s.show_notifications);
        assert_eq!(s.policy.max_delay_ms, 30_000);
    }
}
