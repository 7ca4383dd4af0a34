use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

/// Low-bandwidth endpoint that answers `204 No Content`.
pub const DEFAULT_PROBE_TARGET: &str = "http://clients3.google.com/generate_204";

/// Browser-like agent; some mirrors refuse unknown clients on range requests.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Settings for the transfer engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Bytes written per chunk; cancellation is checked between chunks.
    pub chunk_size: usize,
    pub connect_timeout_ms: u64,
    pub read_timeout_ms: u64,
    /// Pause before every retry.
    pub retry_delay_ms: u64,
    /// `None` retries forever.
    pub max_retries: Option<u32>,
    pub user_agent: String,
    /// Bytes per second.
    pub rate_limit: Option<u32>,
    pub show_progress: bool,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1024 * 1024, // 1 MB
            connect_timeout_ms: 5_000,
            read_timeout_ms: 10_000,
            retry_delay_ms: 3_000,
            max_retries: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            rate_limit: None,
            show_progress: true,
        }
    }
}

impl TransferConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 || self.chunk_size > u32::MAX as usize {
            return Err(ConfigError::Invalid(format!(
                "chunk_size must be between 1 and {} bytes",
                u32::MAX
            )));
        }
        if self.connect_timeout_ms >= self.read_timeout_ms {
            return Err(ConfigError::Invalid(
                "connect_timeout_ms must be shorter than read_timeout_ms".into(),
            ));
        }
        if self.rate_limit == Some(0) {
            return Err(ConfigError::Invalid("rate_limit must be positive".into()));
        }
        Ok(())
    }
}

/// Settings for the health monitor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub target: String,
    pub interval_ms: u64,
    /// Must be shorter than `interval_ms`.
    pub timeout_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_PROBE_TARGET.to_string(),
            interval_ms: 5_000,
            timeout_ms: 3_000,
        }
    }
}

impl MonitorConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub transfer: TransferConfig,
    pub monitor: MonitorConfig,
}

impl Settings {
    /// Loads settings from a JSON file, or the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&content)?)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.transfer.validate()?;

        let m = &self.monitor;
        if m.timeout_ms >= m.interval_ms {
            return Err(ConfigError::Invalid(
                "monitor timeout_ms must be shorter than interval_ms".into(),
            ));
        }
        Ok(())
    }
}
