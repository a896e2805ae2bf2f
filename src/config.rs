//! Configuration
//!
//! YAML config with defaults for every field, so an empty file (or no file
//! at all) yields a working setup pointed at a local scoring service.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use url::Url;

pub const DEFAULT_YELLOW_THRESHOLD: f64 = 0.3;

fn default_backend_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_yellow_threshold() -> f64 {
    DEFAULT_YELLOW_THRESHOLD
}

fn default_scan_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    1
}

fn default_backoff_ms() -> u64 {
    250
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the scoring service.
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Optional fetch proxy. When set, URL scans go through
    /// `GET {proxy_url}?url=...` instead of the backend's JSON endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,

    /// Scores strictly above this (without a phishing flag) are yellow.
    #[serde(default = "default_yellow_threshold")]
    pub yellow_threshold: f64,

    #[serde(default = "default_scan_timeout")]
    pub scan_timeout_seconds: u64,

    /// Block artifacts whose scan never completed. Off by default: an
    /// unreachable scorer must not take the whole surface down with it.
    #[serde(default)]
    pub fail_closed: bool,

    /// Serve canned verdicts instead of calling the backend.
    #[serde(default)]
    pub use_mock: bool,

    #[serde(default)]
    pub clipboard: ClipboardConfig,

    #[serde(default)]
    pub retry: RetryConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipboardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
}

impl Default for ClipboardConfig {
    fn default() -> Self {
        ClipboardConfig {
            enabled: true,
            poll_interval_seconds: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Total attempts per scan, transport failures only. 1 = no retry.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend_url: default_backend_url(),
            proxy_url: None,
            yellow_threshold: default_yellow_threshold(),
            scan_timeout_seconds: default_scan_timeout(),
            fail_closed: false,
            use_mock: false,
            clipboard: ClipboardConfig::default(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)?;
        fs::write(&path, content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        Url::parse(&self.backend_url)
            .with_context(|| format!("backend_url is not a valid URL: {}", self.backend_url))?;

        if let Some(proxy) = &self.proxy_url {
            Url::parse(proxy).with_context(|| format!("proxy_url is not a valid URL: {proxy}"))?;
        }

        if !(0.0..=1.0).contains(&self.yellow_threshold) {
            bail!(
                "yellow_threshold must be between 0.0 and 1.0, got {}",
                self.yellow_threshold
            );
        }

        if self.scan_timeout_seconds == 0 {
            bail!("scan_timeout_seconds must be at least 1");
        }

        if self.clipboard.poll_interval_seconds == 0 {
            bail!("clipboard.poll_interval_seconds must be at least 1");
        }

        if self.retry.max_attempts == 0 {
            bail!("retry.max_attempts must be at least 1");
        }

        Ok(())
    }
}
