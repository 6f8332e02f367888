//! Configuration errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(String),

    /// A single bad value, e.g. an unparsable `BROWSE_RELAY_PORT`.
    #[error("Invalid value for {field}: {message}")]
    InvalidValue { field: String, message: String },

    /// Every problem found by [`ConfigValidator`](crate::ConfigValidator).
    #[error("Invalid configuration: {}", .0.join("; "))]
    Invalid(Vec<String>),

    #[error("Environment variable not set: {0}")]
    EnvVarNotSet(String),

    #[error("Cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let err = ConfigError::NotFound("config.toml".to_string());
        assert!(err.to_string().contains("config.toml"));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_invalid_value_error() {
        let err = ConfigError::InvalidValue {
            field: "BROWSE_RELAY_PORT".to_string(),
            message: "not a port number".to_string(),
        };
        let display = err.to_string();
        assert!(display.contains("BROWSE_RELAY_PORT"));
        assert!(display.contains("not a port number"));
    }

    #[test]
    fn test_invalid_lists_every_problem() {
        let err = ConfigError::Invalid(vec![
            "relay.port: Port cannot be 0".to_string(),
            "relay.max_retries: max_retries must be greater than 0".to_string(),
        ]);
        assert_eq!(
            err.to_string(),
            "Invalid configuration: relay.port: Port cannot be 0; \
             relay.max_retries: max_retries must be greater than 0"
        );
    }

    #[test]
    fn test_env_var_not_set_error() {
        let err = ConfigError::EnvVarNotSet("RELAY_TOKEN".to_string());
        assert!(err.to_string().contains("RELAY_TOKEN"));
        assert!(err.to_string().contains("not set"));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = ConfigError::from(io_err);
        assert!(err.to_string().contains("file not found"));
    }
}
