#![allow(dead_code)]

pub mod scripted;
pub mod status_server;

use std::sync::{Arc, Mutex};

use fetchguard_core::report::{ErrorContext, NotificationSink};

/// Sink that records every context it receives.
pub fn recording_sink() -> (Arc<Mutex<Vec<ErrorContext>>>, Arc<dyn NotificationSink>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink_seen = Arc::clone(&seen);
    let sink: Arc<dyn NotificationSink> = Arc::new(move |c: &ErrorContext| {
        sink_seen.lock().unwrap().push(c.clone());
    });
    (seen, sink)
}
