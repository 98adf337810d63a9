//! CLI command handlers. Each command is in its own file.

mod classify;
mod config;
mod fetch;

pub use classify::run_classify;
pub use config::run_config;
pub use fetch::{run_fetch, FetchArgs};

#[cfg(test)]
pub use fetch::parse_header;
