use anyhow::{Context, Result};
use std::path::PathBuf;

/// Config directory for bufferer. Not created here; config is only ever read.
pub fn bufferer_config_dir() -> Result<PathBuf> {
    Ok(dirs::config_dir()
        .context("Unable to determine user config directory")?
        .join("bufferer"))
}

pub fn bufferer_config_path() -> Result<PathBuf> {
    Ok(bufferer_config_dir()?.join("config.toml"))
}
