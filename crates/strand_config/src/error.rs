//! Error types for configuration loading and validation.

/// Errors that can occur when loading or validating a `strand.toml` configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// An I/O error occurred while reading the configuration file.
    #[error("failed to read configuration: {0}")]
    IoError(#[from] std::io::Error),

    /// The TOML content could not be parsed.
    #[error("failed to parse configuration: {0}")]
    ParseError(String),

    /// A required field is missing from the configuration.
    #[error("missing required field: {0}")]
    MissingField(String),

    /// The configured top circuit does not exist in the schematic.
    #[error("unknown circuit '{0}'")]
    UnknownCircuit(String),

    /// A configuration value failed validation.
    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_unknown_circuit() {
        let err = ConfigError::UnknownCircuit("alu".to_string());
        assert_eq!(err.to_string(), "unknown circuit 'alu'");
    }

    #[test]
    fn display_missing_field() {
        let err = ConfigError::MissingField("project.schematic".to_string());
        assert_eq!(err.to_string(), "missing required field: project.schematic");
    }

    #[test]
    fn from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ConfigError = io_err.into();
        assert!(matches!(err, ConfigError::IoError(_)));
        assert!(err.to_string().contains("gone"));
    }
}
