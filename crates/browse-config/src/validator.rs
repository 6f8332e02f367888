//! Configuration validation.

use std::net::IpAddr;

use crate::error::ConfigError;
use crate::schema::Config;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &Config) -> Result<ValidationResult, ConfigError> {
        let mut result = ValidationResult::default();

        Self::validate_relay(config, &mut result);
        Self::validate_scraping(config, &mut result);

        Ok(result)
    }

    /// Validate, failing with every error at once. Warnings are returned.
    pub fn ensure_valid(config: &Config) -> Result<Vec<ValidationWarning>, ConfigError> {
        let result = Self::validate(config)?;
        if !result.is_valid() {
            let problems = result
                .errors
                .iter()
                .map(|e| format!("{}: {}", e.path, e.message))
                .collect();
            return Err(ConfigError::Invalid(problems));
        }
        Ok(result.warnings)
    }

    fn validate_relay(config: &Config, result: &mut ValidationResult) {
        let relay = &config.relay;

        if !matches!(
            relay.scheme.to_ascii_lowercase().as_str(),
            "ws" | "wss" | "http" | "https"
        ) {
            result.add_error(ValidationError::new(
                "relay.scheme",
                format!("'{}' is not one of ws, wss, http, https", relay.scheme),
            ));
        }

        if relay.port == 0 {
            result.add_error(ValidationError::new("relay.port", "Port cannot be 0"));
        }

        if relay.host.is_empty() {
            result.add_error(ValidationError::new("relay.host", "Host cannot be empty"));
        } else if !is_loopback(&relay.host) {
            result.add_warning(ValidationWarning::new(
                "relay.host",
                format!(
                    "'{}' is not a loopback address, the relay exposes a logged-in browser",
                    relay.host
                ),
            ));
        }

        if relay.max_retries == 0 {
            result.add_error(ValidationError::new(
                "relay.max_retries",
                "max_retries must be greater than 0",
            ));
        }

        if relay.connect_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "relay.connect_timeout_ms",
                "connect_timeout_ms must be greater than 0",
            ));
        }
    }

    fn validate_scraping(config: &Config, result: &mut ValidationResult) {
        let scraping = &config.scraping;

        if scraping.navigation_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "scraping.navigation_timeout_ms",
                "navigation_timeout_ms must be greater than 0",
            ));
        }

        if scraping.marker_timeout_ms == 0 {
            result.add_error(ValidationError::new(
                "scraping.marker_timeout_ms",
                "marker_timeout_ms must be greater than 0",
            ));
        }

        if scraping.max_no_growth == 0 {
            result.add_error(ValidationError::new(
                "scraping.max_no_growth",
                "max_no_growth must be greater than 0",
            ));
        }

        if scraping.settle_delay_ms < 250 {
            result.add_warning(ValidationWarning::new(
                "scraping.settle_delay_ms",
                "settle_delay_ms below 250ms rarely gives lazy feeds time to load",
            ));
        }
    }
}

fn is_loopback(host: &str) -> bool {
    host.eq_ignore_ascii_case("localhost")
        || host.parse::<IpAddr>().map(|ip| ip.is_loopback()).unwrap_or(false)
}

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;
