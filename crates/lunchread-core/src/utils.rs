//! Shared utility functions

use camino::Utf8PathBuf;
use std::env;

use crate::error::{Error, Result};

/// Directory name under the home directory holding user configuration
pub const CONFIG_DIR_NAME: &str = ".lunchread";

/// Resolve the configuration directory
///
/// `LUNCHREAD_HOME` names the directory directly. Otherwise it is
/// `.lunchread` under `HOME`, falling back to the platform home directory.
pub fn config_dir() -> Result<Utf8PathBuf> {
    if let Some(dir) = env::var_os("LUNCHREAD_HOME").filter(|v| !v.is_empty()) {
        return utf8(dir.into());
    }

    let home = env::var_os("HOME")
        .filter(|v| !v.is_empty())
        .map(Into::into)
        .or_else(dirs::home_dir)
        .ok_or_else(|| Error::invalid_config("Could not determine home directory"))?;

    Ok(utf8(home)?.join(CONFIG_DIR_NAME))
}

fn utf8(path: std::path::PathBuf) -> Result<Utf8PathBuf> {
    Utf8PathBuf::from_path_buf(path)
        .map_err(|p| Error::invalid_config(format!("Path is not valid UTF-8: {}", p.display())))
}
