//! Hierarchical configuration loader with precedence
//!
//! Loads configuration from multiple sources with the following precedence (low to high):
//! 1. Embedded defaults (built into binary)
//! 2. User config (~/.lunchread/config.yaml, or an explicit path)
//! 3. Environment variables (LUNCHREAD_* prefix)
//! 4. CLI flags (handled by caller)

use crate::error::{Error, Result};
use crate::types::{RetryPolicy, RuntimeConfig, StatusOverride};
use crate::utils::config_dir;
use camino::{Utf8Path, Utf8PathBuf};
use rust_embed::RustEmbed;
use serde::de::DeserializeOwned;
use std::env;
use std::fs;
use std::str::FromStr;
use tracing::debug;

/// Embedded configuration files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../embedded/config/"]
#[prefix = ""]
struct EmbeddedConfigs;

const CONFIG_FILE_NAME: &str = "config.yaml";

/// Configuration hierarchy loader
pub struct HierarchicalConfigLoader {
    /// Base directory for configuration files
    config_dir: Utf8PathBuf,
}

impl HierarchicalConfigLoader {
    /// Create a new hierarchical config loader rooted at ~/.lunchread
    pub fn new() -> Result<Self> {
        Ok(Self {
            config_dir: config_dir()?,
        })
    }

    /// Create a loader with a custom config directory
    pub fn with_dir(config_dir: Utf8PathBuf) -> Self {
        Self { config_dir }
    }

    /// Load runtime configuration with hierarchical precedence
    pub fn load_runtime_config(&self) -> Result<RuntimeConfig> {
        self.load_runtime_config_from(None)
    }

    /// Load runtime configuration, reading `explicit` instead of the default
    /// user file when given
    ///
    /// An explicit path that does not exist is an error; a missing default
    /// user file is not.
    pub fn load_runtime_config_from(&self, explicit: Option<&Utf8Path>) -> Result<RuntimeConfig> {
        let mut config = Self::load_embedded_config::<RuntimeConfig>("runtime-defaults.yaml")?;

        let user_path = match explicit {
            Some(path) if !path.exists() => return Err(Error::config_not_found(path.as_str())),
            Some(path) => Some(path.to_path_buf()),
            None => {
                let path = self.config_dir.join(CONFIG_FILE_NAME);
                path.exists().then_some(path)
            }
        };

        if let Some(path) = user_path {
            debug!("Loading user config from {}", path);
            let file_config = self.load_yaml_file::<RuntimeConfig>(&path)?;
            config = Self::merge_runtime_config(config, file_config);
        }

        config = Self::apply_env_overrides(config)?;

        config
            .retry
            .validate()
            .map_err(|e| Error::invalid_config(e.to_string()))?;

        Ok(config)
    }

    /// Load an embedded configuration file
    fn load_embedded_config<T: DeserializeOwned>(filename: &str) -> Result<T> {
        let embedded_file = EmbeddedConfigs::get(filename).ok_or_else(|| {
            Error::config_not_found(format!("Embedded config not found: {}", filename))
        })?;

        let content = std::str::from_utf8(&embedded_file.data).map_err(|_| {
            Error::invalid_config(format!("Invalid UTF-8 in embedded config: {}", filename))
        })?;

        serde_yaml_ng::from_str(content).map_err(|e| {
            Error::invalid_config(format!(
                "Failed to parse embedded config {}: {}",
                filename, e
            ))
        })
    }

    /// Load a YAML file and parse it
    fn load_yaml_file<T: DeserializeOwned>(&self, path: &Utf8Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        serde_yaml_ng::from_str(&content)
            .map_err(|e| Error::invalid_config(format!("Failed to parse {}: {}", path, e)))
    }

    /// Merge two runtime configs (base is overridden by overlay)
    fn merge_runtime_config(base: RuntimeConfig, overlay: RuntimeConfig) -> RuntimeConfig {
        RuntimeConfig {
            api: overlay.api,
            retry: Self::merge_retry_policy(base.retry, overlay.retry),
            content: overlay.content,
            git: overlay.git,
        }
    }

    /// Merge retry policies
    ///
    /// Per-status overrides accumulate, and an entry present in both is
    /// merged field by field with the overlay winning.
    fn merge_retry_policy(base: RetryPolicy, overlay: RetryPolicy) -> RetryPolicy {
        let mut per_status_overrides = base.per_status_overrides;
        for (status, entry) in overlay.per_status_overrides {
            let merged = match per_status_overrides.get(&status) {
                Some(existing) => StatusOverride {
                    initial_delay_ms: entry.initial_delay_ms.or(existing.initial_delay_ms),
                    backoff_multiplier: entry.backoff_multiplier.or(existing.backoff_multiplier),
                    max_delay_ms: entry.max_delay_ms.or(existing.max_delay_ms),
                },
                None => entry,
            };
            per_status_overrides.insert(status, merged);
        }
        RetryPolicy {
            per_status_overrides,
            ..overlay
        }
    }

    /// Apply environment variable overrides to runtime config
    fn apply_env_overrides(mut config: RuntimeConfig) -> Result<RuntimeConfig> {
        if let Ok(val) = env::var("LUNCHREAD_API_BASE_URL") {
            config.api.base_url = val;
        }

        if let Ok(val) = env::var("LUNCHREAD_MODEL") {
            config.api.model = val;
        }

        if let Some(val) = parse_env("LUNCHREAD_MAX_TOKENS")? {
            config.api.max_tokens = val;
        }

        if let Some(val) = parse_env("LUNCHREAD_TIMEOUT_SECS")? {
            config.api.timeout_secs = val;
        }

        if let Some(val) = parse_env("LUNCHREAD_MAX_ATTEMPTS")? {
            config.retry.max_attempts = val;
        }

        if let Some(val) = parse_env("LUNCHREAD_BASE_DELAY_MS")? {
            config.retry.base_delay_ms = val;
        }

        if let Ok(val) = env::var("LUNCHREAD_CONTENT_FILE") {
            config.content.file = val;
        }

        if let Some(val) = parse_env("LUNCHREAD_GIT_ENABLED")? {
            config.git.enabled = val;
        }

        if let Some(val) = parse_env("LUNCHREAD_GIT_PUSH")? {
            config.git.push = val;
        }

        Ok(config)
    }

    /// Get the config directory path
    pub fn config_dir(&self) -> &Utf8Path {
        &self.config_dir
    }
}

fn parse_env<T: FromStr>(name: &str) -> Result<Option<T>> {
    match env::var(name) {
        Ok(val) => val
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| Error::invalid_config(format!("{} has an invalid value: {}", name, val))),
        Err(_) => Ok(None),
    }
}
