//! Service configuration.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::service::Severity;

/// Environment override for the communication base folder.
pub const BASE_DIR_ENV: &str = "FILEBRIDGE_DIR";

const DEFAULT_POLL_INTERVAL_MS: u64 = 300;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base of the communication tree (`requests/`, `responses/`, info file).
    #[serde(default = "default_base_path")]
    pub base_path: PathBuf,

    /// Delay between request-directory scans. A responsiveness/IO
    /// trade-off, not a protocol invariant.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Ceiling for messages forwarded to the log sink.
    #[serde(default)]
    pub verbosity: Severity,
}

fn default_base_path() -> PathBuf {
    if let Ok(dir) = std::env::var(BASE_DIR_ENV) {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("filebridge")
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL_MS
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_path: default_base_path(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            verbosity: Severity::default(),
        }
    }
}

impl ServiceConfig {
    pub fn from_file(path: &str) -> Result<Self> {
        let raw = std::fs::read_to_string(path).context("reading config file")?;
        serde_json::from_str(&raw).context("parsing config JSON")
    }

    pub fn with_base_path(mut self, base: impl Into<PathBuf>) -> Self {
        self.base_path = base.into();
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval_ms = interval.as_millis() as u64;
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}
