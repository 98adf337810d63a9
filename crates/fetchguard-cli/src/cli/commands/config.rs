//! `fetchguard config` – show the effective configuration.

use anyhow::Result;
use fetchguard_core::config::{self, FetchguardConfig};

pub fn run_config(cfg: &FetchguardConfig, path_only: bool) -> Result<()> {
    if path_only {
        println!("{}", config::config_path()?.display());
        return Ok(());
    }
    // Validate overrides before showing anything.
    cfg.to_settings()?;
    let effective = FetchguardConfig {
        retry: Some(cfg.retry.clone().unwrap_or_default()),
        ..cfg.clone()
    };
    print!("{}", toml::to_string_pretty(&effective)?);
    Ok(())
}
