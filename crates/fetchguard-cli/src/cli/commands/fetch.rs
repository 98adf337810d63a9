//! `fetchguard fetch <url>` – issue a request through the retrying executor.

use std::io::Write;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use fetchguard_core::issuer::{CurlIssuer, Request};
use fetchguard_core::report::{ErrorContext, NotificationSink};
use fetchguard_core::retry::{HandlerSettings, PolicyUpdate, RequestOptions, RetryingExecutor};

#[derive(Debug, Clone)]
pub struct FetchArgs {
    pub url: String,
    pub method: String,
    pub headers: Vec<String>,
    pub data: Option<String>,
    pub timeout_ms: Option<u64>,
    pub retries: Option<u32>,
    pub no_retry: bool,
    pub skip_error_handler: bool,
}

/// Split a `Name: value` header argument.
pub fn parse_header(raw: &str) -> Result<(String, String)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("header must look like 'Name: value', got {raw:?}");
    };
    let name = name.trim();
    if name.is_empty() {
        bail!("header name is empty in {raw:?}");
    }
    Ok((name.to_string(), value.trim().to_string()))
}

/// Notifications go to stderr so stdout carries only the body.
fn stderr_sink() -> Arc<dyn NotificationSink> {
    Arc::new(|ctx: &ErrorContext| {
        eprintln!(
            "[{}] {} ({} {}): {}",
            ctx.description.severity,
            ctx.description.title(),
            ctx.method,
            ctx.url,
            ctx.user_message()
        );
        if let Some(hint) = &ctx.description.hint {
            eprintln!("  hint: {hint}");
        }
    })
}

pub async fn run_fetch(settings: HandlerSettings, args: FetchArgs) -> Result<()> {
    let executor = RetryingExecutor::new(settings, stderr_sink());
    if args.no_retry {
        executor.update_policy(PolicyUpdate {
            enable_retry: Some(false),
            ..PolicyUpdate::default()
        });
    }

    let mut request = Request::new(args.method.to_ascii_uppercase(), args.url).options(
        RequestOptions {
            timeout_ms: args.timeout_ms,
            max_retries: args.retries,
            skip_error_handler: args.skip_error_handler,
        },
    );
    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.header(name, value);
    }
    if let Some(data) = args.data {
        request = request.body(data);
    }

    let response = executor.fetch(&CurlIssuer::default(), &request).await?;
    tracing::info!(url = %request.url, status = response.status, bytes = response.body.len(), "fetched");

    let mut stdout = std::io::stdout().lock();
    stdout
        .write_all(&response.body)
        .context("writing response body")?;
    stdout.flush()?;
    Ok(())
}
