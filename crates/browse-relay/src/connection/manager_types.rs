//! Connection manager type definitions and configuration.

use std::time::Duration;

use browse_config::RelaySection;
use serde::Serialize;
use thiserror::Error;

use crate::cdp::CdpError;

/// Connection manager errors.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Relay refused the connection at {endpoint} after {attempts} attempt(s)")]
    ConnectionRefused { endpoint: String, attempts: u32 },

    #[error("Connection to relay at {endpoint} timed out after {timeout_ms}ms")]
    ConnectionTimeout { endpoint: String, timeout_ms: u64 },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("No pages available in the connected browser")]
    NoPagesAvailable,

    #[error("Invalid page index: {index}. Available: 0-{}", .len.saturating_sub(1))]
    InvalidPageIndex { index: usize, len: usize },

    #[error(transparent)]
    Cdp(#[from] CdpError),
}

/// Coarse classification of a [`RelayError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelayErrorKind {
    ConnectionRefused,
    ConnectionTimeout,
    ConnectionFailed,
    NoPagesAvailable,
    InvalidPageIndex,
    Protocol,
}

impl RelayError {
    pub fn kind(&self) -> RelayErrorKind {
        match self {
            RelayError::ConnectionRefused { .. } => RelayErrorKind::ConnectionRefused,
            RelayError::ConnectionTimeout { .. } => RelayErrorKind::ConnectionTimeout,
            RelayError::ConnectionFailed(_) => RelayErrorKind::ConnectionFailed,
            RelayError::NoPagesAvailable => RelayErrorKind::NoPagesAvailable,
            RelayError::InvalidPageIndex { .. } => RelayErrorKind::InvalidPageIndex,
            RelayError::Cdp(CdpError::SessionClosed) => RelayErrorKind::ConnectionFailed,
            RelayError::Cdp(CdpError::ConnectionRefused(_)) => RelayErrorKind::ConnectionRefused,
            RelayError::Cdp(CdpError::ConnectionFailed(_) | CdpError::WebSocket(_)) => {
                RelayErrorKind::ConnectionFailed
            }
            RelayError::Cdp(_) => RelayErrorKind::Protocol,
        }
    }

    /// Classify a failed connect attempt.
    pub(super) fn from_connect(err: CdpError, endpoint: &str, attempts: u32) -> Self {
        match err {
            CdpError::ConnectionRefused(_) => RelayError::ConnectionRefused {
                endpoint: endpoint.to_string(),
                attempts,
            },
            other => RelayError::ConnectionFailed(format!("{}: {}", endpoint, other)),
        }
    }
}

/// Connection state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
}

/// One row of [`ConnectionManager::list_pages`](super::ConnectionManager::list_pages).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageSummary {
    pub index: usize,
    pub url: String,
    pub title: String,
    pub current: bool,
}

/// URL and title of the current tab.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageInfo {
    pub url: String,
    pub title: String,
}

/// Connection manager configuration.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Relay endpoint, `ws://` or `http://`.
    pub endpoint: String,
    /// Bound on a single connect attempt.
    pub connect_timeout: Duration,
    /// Attempt ceiling for refused connections.
    pub max_retries: u32,
    /// First backoff delay, doubled per attempt.
    pub initial_retry_delay: Duration,
    /// Schedule a reconnect when an established connection drops.
    pub auto_reconnect: bool,
    pub reconnect_delay: Duration,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::from(&RelaySection::default())
    }
}

impl From<&RelaySection> for ConnectionConfig {
    fn from(relay: &RelaySection) -> Self {
        Self {
            endpoint: relay.endpoint(),
            connect_timeout: Duration::from_millis(relay.connect_timeout_ms),
            max_retries: relay.max_retries,
            initial_retry_delay: Duration::from_millis(relay.initial_retry_delay_ms),
            auto_reconnect: relay.auto_reconnect,
            reconnect_delay: Duration::from_millis(relay.reconnect_delay_ms),
        }
    }
}
