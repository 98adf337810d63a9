//! Integration test: libcurl issuer against a local scripted HTTP server.

mod common;

use std::net::TcpListener;
use std::time::Duration;

use common::status_server::{self, Reply};
use fetchguard_core::issuer::{CurlIssuer, Request};
use fetchguard_core::retry::{FailureKind, RequestOptions, RetryPolicy, RetryingExecutor};

fn fast_executor() -> (
    RetryingExecutor,
    std::sync::Arc<std::sync::Mutex<Vec<fetchguard_core::ErrorContext>>>,
) {
    let (seen, sink) = common::recording_sink();
    let policy = RetryPolicy {
        base_delay_ms: 10,
        max_delay_ms: 50,
        timeout_ms: 5_000,
        ..RetryPolicy::default()
    };
    (RetryingExecutor::with_policy(policy, sink), seen)
}

#[tokio::test]
async fn retries_until_server_recovers() {
    let server = status_server::start(vec![
        Reply::new(503, "Service Unavailable"),
        Reply::new(503, "Service Unavailable"),
        Reply::new(200, "OK").body("ready"),
    ]);
    let (exec, seen) = fast_executor();

    let response = exec
        .fetch(&CurlIssuer::default(), &Request::get(server.url.as_str()))
        .await
        .expect("third attempt succeeds");

    assert_eq!(response.status, 200);
    assert_eq!(response.body, b"ready");
    assert_eq!(response.header("content-length"), Some("5"));
    assert_eq!(server.hits(), 3);
    assert!(seen.lock().unwrap().is_empty());
}

#[tokio::test]
async fn not_found_is_reported_without_retry() {
    let server = status_server::start(vec![Reply::new(404, "Not Found")]);
    let (exec, seen) = fast_executor();

    let err = exec
        .fetch(&CurlIssuer::default(), &Request::get(server.url.as_str()))
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), Some(404));
    assert_eq!(err.failure.to_string(), "HTTP 404: Not Found");
    assert_eq!(server.hits(), 1);
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    assert_eq!(seen[0].url, server.url);
}

#[tokio::test]
async fn slow_server_hits_the_attempt_deadline() {
    let server = status_server::start(vec![Reply::new(200, "OK").delay(Duration::from_secs(3))]);
    let (exec, _seen) = fast_executor();
    let request = Request::get(server.url.as_str()).options(RequestOptions {
        timeout_ms: Some(200),
        max_retries: Some(0),
        ..RequestOptions::default()
    });

    let started = std::time::Instant::now();
    let err = exec
        .fetch(&CurlIssuer::default(), &request)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Timeout);
    assert_eq!(err.context.status_code(), 408);
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn refused_connection_is_a_transport_failure() {
    // Bind then drop to get a port nobody listens on.
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let (exec, seen) = fast_executor();
    let request = Request::get(format!("http://127.0.0.1:{port}/")).options(RequestOptions {
        max_retries: Some(1),
        ..RequestOptions::default()
    });

    let err = exec
        .fetch(&CurlIssuer::default(), &request)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), FailureKind::Transport);
    assert_eq!(err.context.retry_count, 1);
    assert_eq!(err.context.status_code(), 0);
    assert_eq!(seen.lock().unwrap().len(), 1);
}
