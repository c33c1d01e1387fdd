//! Monitor configuration loading

use std::path::Path;

use proctor_monitor::{MonitorConfig, StrictnessProfile};
use tracing::debug;

use crate::error::{CliError, CliResult};

/// Load a monitor configuration.
///
/// A TOML file, when given and present, replaces the profile preset entirely;
/// sections it omits take the standard defaults. A missing file falls back to
/// the preset.
pub fn load(path: Option<&Path>, profile: StrictnessProfile) -> CliResult<MonitorConfig> {
    let config = match path {
        Some(path) if path.exists() => {
            let contents = std::fs::read_to_string(path)?;
            debug!(path = %path.display(), "Loading monitor config");
            toml::from_str(&contents).map_err(|e| CliError::Config(e.to_string()))?
        }
        _ => MonitorConfig::for_profile(profile),
    };
    config
        .validate()
        .map_err(|e| CliError::Config(e.to_string()))?;
    Ok(config)
}

/// Render a configuration as TOML.
pub fn render(config: &MonitorConfig) -> CliResult<String> {
    toml::to_string_pretty(config).map_err(|e| CliError::Config(e.to_string()))
}
