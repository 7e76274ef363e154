//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;
use strand_diagnostics::{Category, DiagnosticCode};

/// File name of the project configuration.
pub const CONFIG_FILE: &str = "strand.toml";

/// Loads and validates `<project_dir>/strand.toml`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let content = std::fs::read_to_string(project_dir.join(CONFIG_FILE))?;
    load_config_from_str(&content)
}

/// Parses and validates a `strand.toml` configuration from a string.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.project.name.is_empty() {
        return Err(ConfigError::MissingField("project.name".to_string()));
    }
    if config.project.schematic.is_empty() {
        return Err(ConfigError::MissingField("project.schematic".to_string()));
    }
    if matches!(config.project.top.as_deref(), Some("")) {
        return Err(ConfigError::ValidationError(
            "project.top must not be empty when given".to_string(),
        ));
    }
    for code in config.drc.allow.iter().chain(&config.drc.deny) {
        let parsed: DiagnosticCode = code
            .parse()
            .map_err(|e| ConfigError::ValidationError(format!("{e}")))?;
        if parsed.category != Category::Warning {
            return Err(ConfigError::ValidationError(format!(
                "only warning codes can be allowed or denied, got `{code}`"
            )));
        }
    }
    if let Some(code) = config
        .drc
        .allow
        .iter()
        .find(|c| config.drc.deny.iter().any(|d| d.eq_ignore_ascii_case(c)))
    {
        return Err(ConfigError::ValidationError(format!(
            "`{code}` is both allowed and denied"
        )));
    }
    Ok(())
}
