//! Configuration schema definitions.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub relay: RelaySection,

    #[serde(default)]
    pub scraping: ScrapingSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Remote-debugging relay settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelaySection {
    /// `ws`/`wss` to attach directly, `http`/`https` to discover the browser
    /// websocket through `/json/version`.
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Relay host.
    #[serde(default = "default_host")]
    pub host: String,

    /// Relay port.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Optional websocket path appended to `ws://host:port`.
    #[serde(default)]
    pub path: Option<String>,

    /// Connect timeout per attempt, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Attempt ceiling for "connection refused" failures.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// First backoff delay; doubles after every failed attempt.
    #[serde(default = "default_initial_retry_delay_ms")]
    pub initial_retry_delay_ms: u64,

    /// Schedule a reconnect after the relay drops an established connection.
    #[serde(default = "default_true")]
    pub auto_reconnect: bool,

    /// Delay before the background reconnect.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
}

fn default_scheme() -> String {
    "ws".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    19988
}

fn default_connect_timeout_ms() -> u64 {
    30_000
}

fn default_max_retries() -> u32 {
    3
}

fn default_initial_retry_delay_ms() -> u64 {
    100
}

fn default_reconnect_delay_ms() -> u64 {
    2_000
}

impl Default for RelaySection {
    fn default() -> Self {
        Self {
            scheme: default_scheme(),
            host: default_host(),
            port: default_port(),
            path: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            max_retries: default_max_retries(),
            initial_retry_delay_ms: default_initial_retry_delay_ms(),
            auto_reconnect: true,
            reconnect_delay_ms: default_reconnect_delay_ms(),
        }
    }
}

impl RelaySection {
    /// Relay endpoint, e.g. `ws://127.0.0.1:19988` or `http://127.0.0.1:9222`.
    pub fn endpoint(&self) -> String {
        let path = self
            .path
            .as_deref()
            .map(|p| format!("/{}", p.trim_start_matches('/')))
            .unwrap_or_default();
        format!(
            "{}://{}:{}{}",
            self.scheme.to_ascii_lowercase(),
            self.host,
            self.port,
            path
        )
    }
}

/// Scraping engine tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrapingSection {
    /// Page navigation timeout.
    #[serde(default = "default_navigation_timeout_ms")]
    pub navigation_timeout_ms: u64,

    /// How long to wait for a site's "content loaded" marker.
    #[serde(default = "default_marker_timeout_ms")]
    pub marker_timeout_ms: u64,

    /// Wait after each scroll before re-measuring the page.
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Consecutive scrolls without growth before a collection gives up.
    #[serde(default = "default_max_no_growth")]
    pub max_no_growth: u32,
}

fn default_navigation_timeout_ms() -> u64 {
    30_000
}

fn default_marker_timeout_ms() -> u64 {
    10_000
}

fn default_settle_delay_ms() -> u64 {
    1_500
}

fn default_max_no_growth() -> u32 {
    10
}

impl Default for ScrapingSection {
    fn default() -> Self {
        Self {
            navigation_timeout_ms: default_navigation_timeout_ms(),
            marker_timeout_ms: default_marker_timeout_ms(),
            settle_delay_ms: default_settle_delay_ms(),
            max_no_growth: default_max_no_growth(),
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Default filter when `RUST_LOG` is unset.
    #[serde(default = "default_level")]
    pub level: String,

    /// Directory for daily rolling log files. Stderr only when unset.
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_level(),
            dir: None,
        }
    }
}
