//! Check command

use anyhow::Result;
use camino::Utf8Path;

use super::{build_client, load_config};
use crate::cli::CheckArgs;
use crate::output;

pub async fn run(args: CheckArgs, config_path: Option<&Utf8Path>) -> Result<()> {
    let config = load_config(config_path)?;
    let client = build_client(&config, &args.api)?;

    let spinner = output::spinner("Validating API connection...");
    let result = client.ping().await;
    spinner.finish_and_clear();
    result?;

    output::success("API connection is valid");
    output::kv("Endpoint", &config.api.base_url);
    output::kv("Model", &config.api.model);
    Ok(())
}
