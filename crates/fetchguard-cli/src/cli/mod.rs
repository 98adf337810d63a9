//! CLI for the fetchguard retry engine.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use fetchguard_core::config;

use commands::{run_classify, run_config, run_fetch, FetchArgs};

/// Top-level CLI for fetchguard.
#[derive(Debug, Parser)]
#[command(name = "fetchguard")]
#[command(about = "fetchguard: HTTP requests with retries, backoff and readable failures", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FailureArg {
    Timeout,
    Transport,
    Other,
}

#[derive(Debug, Subcommand)]
pub enum CliCommand {
    /// Issue a request with retries; the body goes to stdout.
    Fetch {
        /// HTTP/HTTPS URL to request.
        url: String,

        /// Request method.
        #[arg(short = 'X', long = "request", default_value = "GET", value_name = "METHOD")]
        method: String,

        /// Extra header, `Name: value`. May be repeated.
        #[arg(short = 'H', long = "header", value_name = "HEADER")]
        headers: Vec<String>,

        /// Request body.
        #[arg(long)]
        data: Option<String>,

        /// Per-attempt deadline in milliseconds (overrides config).
        #[arg(long, value_name = "MS")]
        timeout_ms: Option<u64>,

        /// Retry budget for this request (overrides config).
        #[arg(long, value_name = "N")]
        retries: Option<u32>,

        /// Fail on the first error.
        #[arg(long)]
        no_retry: bool,

        /// Single attempt, no deadline, no notification; print whatever comes back.
        #[arg(long)]
        skip_error_handler: bool,
    },

    /// Describe an HTTP status or a non-HTTP failure as a user would see it.
    Classify {
        /// HTTP status code.
        #[arg(required_unless_present = "failure", conflicts_with = "failure")]
        status: Option<u16>,

        /// Describe a failure that produced no response.
        #[arg(long, value_enum)]
        failure: Option<FailureArg>,
    },

    /// Show the effective configuration.
    Config {
        /// Print only the config file path.
        #[arg(long)]
        path: bool,
    },
}

impl CliCommand {
    pub async fn run_from_args() -> Result<()> {
        let cli = Cli::parse();
        let cfg = config::load_or_init()?;
        tracing::debug!("loaded config: {:?}", cfg);

        match cli.command {
            CliCommand::Fetch {
                url,
                method,
                headers,
                data,
                timeout_ms,
                retries,
                no_retry,
                skip_error_handler,
            } => {
                let args = FetchArgs {
                    url,
                    method,
                    headers,
                    data,
                    timeout_ms,
                    retries,
                    no_retry,
                    skip_error_handler,
                };
                run_fetch(cfg.to_settings()?, args).await?;
            }
            CliCommand::Classify { status, failure } => {
                run_classify(&cfg.to_settings()?, status, failure)?;
            }
            CliCommand::Config { path } => run_config(&cfg, path)?,
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
