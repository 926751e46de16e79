// src/config/mod.rs
mod models;

pub use models::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Prefix of environment variables that override file settings,
/// e.g. `MONITORING_SCRIPTS_DIR`.
pub const ENV_PREFIX: &str = "MONITORING";

/// Load configuration from an optional file (YAML, JSON or TOML, picked by
/// extension) layered under `MONITORING_*` environment variables.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut builder = config::Config::builder();
    if let Some(path) = path {
        builder = builder.add_source(config::File::from(path).required(true));
    }

    let settings = builder
        .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
        .build()
        .context("Failed to read configuration")?;

    let config: Config = settings
        .try_deserialize()
        .context("Failed to parse configuration")?;

    config.validate()?;
    Ok(config)
}
