//! In-memory issuer that replays a fixed script of outcomes.
//!
//! Once the script runs out the last outcome repeats. Every attempt's abort
//! signal and start time are kept so tests can check deadlines and delays.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fetchguard_core::control::AbortSignal;
use fetchguard_core::issuer::{Issuer, Request, Response};
use fetchguard_core::retry::Failure;
use tokio::time::Instant;

#[derive(Debug, Clone)]
pub enum Step {
    Reply(u16),
    Fail(Failure),
    /// Never answers within any sane deadline.
    Hang,
}

pub struct ScriptedIssuer {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
    calls: AtomicUsize,
    signals: Mutex<Vec<AbortSignal>>,
    started: Mutex<Vec<Instant>>,
}

impl ScriptedIssuer {
    pub fn new(steps: impl IntoIterator<Item = Step>) -> Self {
        Self {
            steps: Mutex::new(steps.into_iter().collect()),
            last: Mutex::new(None),
            calls: AtomicUsize::new(0),
            signals: Mutex::new(Vec::new()),
            started: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn signals(&self) -> Vec<AbortSignal> {
        self.signals.lock().unwrap().clone()
    }

    /// Time between the starts of consecutive attempts.
    pub fn gaps(&self) -> Vec<Duration> {
        self.started
            .lock()
            .unwrap()
            .windows(2)
            .map(|w| w[1] - w[0])
            .collect()
    }

    fn next_step(&self) -> Step {
        let mut last = self.last.lock().unwrap();
        if let Some(step) = self.steps.lock().unwrap().pop_front() {
            *last = Some(step);
        }
        last.clone().unwrap_or(Step::Reply(200))
    }
}

#[async_trait]
impl Issuer for ScriptedIssuer {
    async fn issue(&self, _request: &Request, abort: AbortSignal) -> Result<Response, Failure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.signals.lock().unwrap().push(abort);
        self.started.lock().unwrap().push(Instant::now());
        match self.next_step() {
            Step::Reply(status) => Ok(Response::new(status)),
            Step::Fail(failure) => Err(failure),
            Step::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(Response::new(200))
            }
        }
    }
}
