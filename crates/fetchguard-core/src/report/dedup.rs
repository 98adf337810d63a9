//! Time-bounded suppression of repeated terminal-failure notifications.
//!
//! A key that was reported less than one throttle interval ago is dropped.
//! The window is fixed: a suppressed duplicate does not move the key's
//! reported-at time. Entries are purged lazily once they are older than
//! `EXPIRY_FACTOR` throttle intervals, so the window holds no timers and
//! has nothing to cancel on shutdown beyond clearing its map.

use std::collections::HashMap;
use std::time::Duration;

use tokio::time::Instant;

/// Entries older than this many throttle intervals are dropped.
pub const EXPIRY_FACTOR: u32 = 5;

/// Identity of a reported failure.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DedupKey {
    pub status_code: u16,
    pub url: String,
    pub method: String,
}

#[derive(Debug)]
pub struct DedupWindow {
    throttle: Duration,
    reported: HashMap<DedupKey, Instant>,
}

impl DedupWindow {
    pub fn new(throttle: Duration) -> Self {
        Self {
            throttle,
            reported: HashMap::new(),
        }
    }

    pub fn throttle(&self) -> Duration {
        self.throttle
    }

    /// Age after which an entry is forgotten entirely.
    pub fn expiry(&self) -> Duration {
        self.throttle.saturating_mul(EXPIRY_FACTOR)
    }

    /// Returns true if `key` may be reported at `now`, recording it if so.
    pub fn admit(&mut self, key: DedupKey, now: Instant) -> bool {
        self.purge(now);
        if let Some(reported_at) = self.reported.get(&key) {
            if now.saturating_duration_since(*reported_at) < self.throttle {
                return false;
            }
        }
        self.reported.insert(key, now);
        true
    }

    fn purge(&mut self, now: Instant) {
        let expiry = self.expiry();
        self.reported
            .retain(|_, reported_at| now.saturating_duration_since(*reported_at) < expiry);
    }

    pub fn len(&self) -> usize {
        self.reported.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reported.is_empty()
    }

    pub fn clear(&mut self) {
        self.reported.clear();
    }
}
