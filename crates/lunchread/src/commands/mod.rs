//! CLI command implementations

pub mod check;
pub mod config;
pub mod generate;

use anyhow::{Context, Result};
use camino::Utf8Path;
use lunchread_core::types::RuntimeConfig;
use lunchread_core::HierarchicalConfigLoader;
use lunchread_generator::{Error as GeneratorError, MessagesClient};

use crate::cli::ApiKeyArgs;

/// Resolve the runtime configuration: defaults, user file, environment
pub fn load_config(explicit: Option<&Utf8Path>) -> Result<RuntimeConfig> {
    let loader =
        HierarchicalConfigLoader::new().context("Failed to locate configuration directory")?;
    loader
        .load_runtime_config_from(explicit)
        .context("Failed to load configuration")
}

/// Build a Messages API client from config and the supplied key
pub fn build_client(config: &RuntimeConfig, api: &ApiKeyArgs) -> Result<MessagesClient> {
    let api_key = api
        .api_key
        .as_deref()
        .filter(|key| !key.trim().is_empty())
        .ok_or(GeneratorError::MissingApiKey)?;

    Ok(MessagesClient::new(
        config.api.clone(),
        api_key,
        config.retry.clone(),
    )?)
}
