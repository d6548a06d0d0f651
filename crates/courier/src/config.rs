//! Dealer configuration: application identity, declared services, and
//! runtime tuning. A TOML file plus environment overrides.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use courier_core::MessagePolicy;

pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 100;
pub const DEFAULT_PRUNE_INTERVAL_MS: u64 = 1_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
}

/// Per-service configuration block.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Remote application name; defaults to the service alias.
    pub app: Option<String>,
    /// Default deadline applied when a submission carries no policy.
    pub deadline_ms: Option<u64>,
}

impl ServiceConfig {
    pub fn default_policy(&self) -> MessagePolicy {
        MessagePolicy {
            deadline: self.deadline_ms.map(Duration::from_millis),
        }
    }
}

/// Top-level dealer configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Client application identity.
    pub app_name: String,
    /// Deadline sweeper cadence.
    pub sweep_interval_ms: u64,
    /// Minimum spacing between response-registry prune passes.
    pub prune_interval_ms: u64,
    /// Declared services, keyed by alias.
    pub services: BTreeMap<String, ServiceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app_name: "courier".to_string(),
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            prune_interval_ms: DEFAULT_PRUNE_INTERVAL_MS,
            services: BTreeMap::new(),
        }
    }
}

impl Config {
    /// Load a config file and apply environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: Config = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        apply_env_overrides(&mut config);
        tracing::debug!(
            path = %path.display(),
            services = config.services.len(),
            "loaded dealer config"
        );
        Ok(config)
    }

    /// Load a config file, falling back to defaults (with environment
    /// overrides still applied) when it is missing or malformed.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!("config load failed, using defaults: {err}");
                let mut config = Config::default();
                apply_env_overrides(&mut config);
                config
            }
        }
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn prune_interval(&self) -> Duration {
        Duration::from_millis(self.prune_interval_ms)
    }
}

pub fn apply_env_overrides(config: &mut Config) {
    apply_env_overrides_from(config, |key| std::env::var(key).ok());
}

fn apply_env_overrides_from<F>(config: &mut Config, mut lookup: F)
where
    F: FnMut(&str) -> Option<String>,
{
    if let Some(raw) = lookup("COURIER_APP_NAME") {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            config.app_name = trimmed.to_string();
        }
    }

    if let Some(raw) = lookup("COURIER_SWEEP_INTERVAL_MS") {
        match raw.trim().parse::<u64>() {
            Ok(value) => config.sweep_interval_ms = value,
            Err(err) => {
                tracing::warn!("invalid COURIER_SWEEP_INTERVAL_MS, ignoring: {err}");
            }
        }
    }

    if let Some(raw) = lookup("COURIER_PRUNE_INTERVAL_MS") {
        match raw.trim().parse::<u64>() {
            Ok(value) => config.prune_interval_ms = value,
            Err(err) => {
                tracing::warn!("invalid COURIER_PRUNE_INTERVAL_MS, ignoring: {err}");
            }
        }
    }
}
