use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::classify::CustomMessages;
use crate::retry::{HandlerSettings, RetryPolicy, DEFAULT_THROTTLE_MS};

/// Retry policy parameters (optional section in config.toml).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Master switch for retries.
    pub enable_retry: bool,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Maximum backoff delay in milliseconds (before jitter).
    pub max_delay_ms: u64,
    /// Multiplier applied per retry.
    pub backoff_factor: f64,
    /// Status codes that are retried.
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        let p = RetryPolicy::default();
        Self {
            enable_retry: p.enable_retry,
            max_retries: p.max_retries,
            base_delay_ms: p.base_delay_ms,
            max_delay_ms: p.max_delay_ms,
            backoff_factor: p.backoff_factor,
            retryable_status_codes: p.retryable_status_codes.into_iter().collect(),
        }
    }
}

/// Global configuration loaded from `~/.config/fetchguard/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchguardConfig {
    /// Per-attempt deadline in milliseconds.
    pub timeout_ms: u64,
    /// Whether terminal failures reach the notification sink.
    pub show_notifications: bool,
    /// Log every reported failure in full.
    #[serde(default)]
    pub debug_mode: bool,
    /// Interval during which an identical failure is not reported twice.
    #[serde(default = "default_throttle_ms")]
    pub throttle_ms: u64,
    /// Optional retry policy; if missing, built-in defaults are used.
    #[serde(default)]
    pub retry: Option<RetryConfig>,
    /// Message overrides keyed by status code (TOML keys are strings).
    #[serde(default)]
    pub custom_messages: BTreeMap<String, String>,
}

fn default_throttle_ms() -> u64 {
    DEFAULT_THROTTLE_MS
}

impl Default for FetchguardConfig {
    fn default() -> Self {
        Self {
            timeout_ms: RetryPolicy::default().timeout_ms,
            show_notifications: true,
            debug_mode: false,
            throttle_ms: DEFAULT_THROTTLE_MS,
            retry: None,
            custom_messages: BTreeMap::new(),
        }
    }
}

impl FetchguardConfig {
    /// Build the engine settings this file describes.
    pub fn to_settings(&self) -> Result<HandlerSettings> {
        let retry = self.retry.clone().unwrap_or_default();
        let policy = RetryPolicy {
            enable_retry: retry.enable_retry,
            max_retries: retry.max_retries,
            base_delay_ms: retry.base_delay_ms,
            max_delay_ms: retry.max_delay_ms,
            backoff_factor: retry.backoff_factor,
            retryable_status_codes: retry.retryable_status_codes.into_iter().collect(),
            timeout_ms: self.timeout_ms,
        };
        let mut custom_messages = CustomMessages::new();
        for (key, message) in &self.custom_messages {
            let status: u16 = key
                .trim()
                .parse()
                .with_context(|| format!("custom_messages key is not a status code: {key}"))?;
            custom_messages.insert(status, message.clone());
        }
        Ok(HandlerSettings {
            policy,
            show_notifications: self.show_notifications,
            debug_mode: self.debug_mode,
            custom_messages,
            throttle: Duration::from_millis(self.throttle_ms),
        })
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("fetchguard")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<FetchguardConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = FetchguardConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from_path(&path)
}

/// Load configuration from an explicit file.
pub fn load_from_path(path: &Path) -> Result<FetchguardConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let cfg: FetchguardConfig =
        toml::from_str(&data).with_context(|| format!("parsing config {}", path.display()))?;
    Ok(cfg)
}
