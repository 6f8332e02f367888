//! Configuration loader.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::error::ConfigError;
use crate::schema::Config;

static ENV_VAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid")
});

/// Environment variable overriding `relay.host`.
pub const RELAY_HOST_ENV: &str = "BROWSE_RELAY_HOST";
/// Environment variable overriding `relay.port`.
pub const RELAY_PORT_ENV: &str = "BROWSE_RELAY_PORT";

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<Config, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: Config = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Load the file if it exists, defaults otherwise, then apply env overrides.
    pub fn load_or_default(path: &Path) -> Result<Config, ConfigError> {
        let mut config = if path.exists() {
            Self::load(path)?
        } else {
            Config::default()
        };
        Self::apply_env_overrides(&mut config, |name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Default config location, `~/.browse/config.toml`.
    pub fn default_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".browse")
            .join("config.toml")
    }

    /// Apply `BROWSE_RELAY_*` overrides using the given variable lookup.
    pub fn apply_env_overrides<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(host) = lookup(RELAY_HOST_ENV).filter(|h| !h.is_empty()) {
            config.relay.host = host;
        }
        if let Some(port) = lookup(RELAY_PORT_ENV).filter(|p| !p.is_empty()) {
            config.relay.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                field: RELAY_PORT_ENV.to_string(),
                message: format!("'{}' is not a port number", port),
            })?;
        }
        Ok(())
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();

        for cap in ENV_VAR.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.browse/logs`).
    pub fn expand_path(path: &Path) -> PathBuf {
        PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).to_string())
    }
}
