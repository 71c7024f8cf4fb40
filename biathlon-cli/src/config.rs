//! Configuration loading
//!
//! The race configuration is JSON; a `.toml` file with the same keys is
//! accepted too.

use anyhow::{Context, Result};
use biathlon_core::RaceConfig;
use std::fs;
use std::path::Path;

/// Load the race configuration from a JSON or TOML file
pub fn load_config(path: &Path) -> Result<RaceConfig> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let is_toml = path
        .extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    let config: RaceConfig = if is_toml {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?
    } else {
        RaceConfig::from_json_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?
    };

    if let Err(e) = config.validate() {
        log::warn!("{:?}: {}", path, e);
    }
    log::debug!("Configuration loaded: {:?}", config);

    Ok(config)
}
