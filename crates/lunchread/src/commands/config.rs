//! Config command

use anyhow::{Context, Result};
use camino::Utf8Path;
use lunchread_core::types::RuntimeConfig;

use super::load_config;
use crate::cli::{ConfigCommands, ConfigShowArgs};

pub fn run(cmd: ConfigCommands, config_path: Option<&Utf8Path>) -> Result<()> {
    match cmd {
        ConfigCommands::Show(args) => show(args, config_path),
    }
}

fn show(args: ConfigShowArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_path)?;
    println!("{}", render(&config, args.json)?);
    Ok(())
}

fn render(config: &RuntimeConfig, json: bool) -> Result<String> {
    if json {
        serde_json::to_string_pretty(config).context("Failed to serialize configuration")
    } else {
        serde_yaml_ng::to_string(config).context("Failed to serialize configuration")
    }
}
