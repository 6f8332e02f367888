//! Scraping errors and their machine-readable classification.

use browse_relay::{CdpError, RelayError, RelayErrorKind};
use serde::Serialize;
use thiserror::Error;

/// Every way a scrape can fail.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Relay(#[from] RelayError),

    #[error("Navigation to {url} timed out after {timeout_ms}ms")]
    NavigationTimeout { url: String, timeout_ms: u64 },

    #[error("Navigation failed: {0}")]
    NavigationFailed(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Profile not found: {0}")]
    ProfileNotFound(String),

    #[error("Login required: {0}")]
    LoginRequired(String),

    #[error("Account suspended: {0}")]
    AccountSuspended(String),

    #[error("Private content: {0}")]
    PrivateContent(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Script execution failed: {0}")]
    ScriptExecutionFailed(String),

    #[error("Script result too large: {size} bytes (max {max})")]
    ScriptResultTooLarge { size: usize, max: usize },

    #[error("Screenshot failed: {0}")]
    ScreenshotFailed(String),

    #[error("Extraction failed: {0}")]
    ExtractionFailed(String),

    #[error(transparent)]
    Cdp(#[from] CdpError),
}

/// Stable error classification exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    ConnectionRefused,
    ConnectionTimeout,
    ConnectionFailed,
    NoPagesAvailable,
    InvalidPageIndex,
    NavigationTimeout,
    NavigationFailed,
    InvalidUrl,
    ElementNotFound,
    ProfileNotFound,
    LoginRequired,
    AccountSuspended,
    PrivateContent,
    RateLimited,
    ScriptExecutionFailed,
    ScriptResultTooLarge,
    ScreenshotFailed,
    ExtractionFailed,
    ProtocolError,
}

impl ErrorKind {
    /// Snake-case identifier, identical to the serialized form.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::ConnectionRefused => "connection_refused",
            ErrorKind::ConnectionTimeout => "connection_timeout",
            ErrorKind::ConnectionFailed => "connection_failed",
            ErrorKind::NoPagesAvailable => "no_pages_available",
            ErrorKind::InvalidPageIndex => "invalid_page_index",
            ErrorKind::NavigationTimeout => "navigation_timeout",
            ErrorKind::NavigationFailed => "navigation_failed",
            ErrorKind::InvalidUrl => "invalid_url",
            ErrorKind::ElementNotFound => "element_not_found",
            ErrorKind::ProfileNotFound => "profile_not_found",
            ErrorKind::LoginRequired => "login_required",
            ErrorKind::AccountSuspended => "account_suspended",
            ErrorKind::PrivateContent => "private_content",
            ErrorKind::RateLimited => "rate_limited",
            ErrorKind::ScriptExecutionFailed => "script_execution_failed",
            ErrorKind::ScriptResultTooLarge => "script_result_too_large",
            ErrorKind::ScreenshotFailed => "screenshot_failed",
            ErrorKind::ExtractionFailed => "extraction_failed",
            ErrorKind::ProtocolError => "protocol_error",
        }
    }

    /// Process exit code used by the CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            ErrorKind::ProtocolError => 1,
            ErrorKind::ConnectionRefused
            | ErrorKind::ConnectionTimeout
            | ErrorKind::ConnectionFailed => 2,
            ErrorKind::NoPagesAvailable => 3,
            ErrorKind::InvalidPageIndex => 4,
            ErrorKind::NavigationTimeout | ErrorKind::NavigationFailed => 5,
            ErrorKind::InvalidUrl => 6,
            ErrorKind::ElementNotFound => 7,
            ErrorKind::ProfileNotFound => 8,
            ErrorKind::LoginRequired => 9,
            ErrorKind::AccountSuspended => 10,
            ErrorKind::PrivateContent => 11,
            ErrorKind::RateLimited => 12,
            ErrorKind::ScriptExecutionFailed | ErrorKind::ScriptResultTooLarge => 13,
            ErrorKind::ScreenshotFailed => 14,
            ErrorKind::ExtractionFailed => 15,
        }
    }

    /// What the user can do about it.
    pub fn hint(&self) -> &'static str {
        match self {
            ErrorKind::ConnectionRefused => {
                "Start the browser relay and check the configured host and port"
            }
            ErrorKind::ConnectionTimeout => {
                "The relay did not answer in time; check that the browser is responsive"
            }
            ErrorKind::ConnectionFailed => "Reconnect to the relay and retry",
            ErrorKind::NoPagesAvailable => "Open at least one tab in the connected browser",
            ErrorKind::InvalidPageIndex => "Run `browse pages` to list valid tab indices",
            ErrorKind::NavigationTimeout => {
                "The page did not finish loading; retry or raise scraping.navigation_timeout_ms"
            }
            ErrorKind::NavigationFailed => "Check the URL and the browser's network access",
            ErrorKind::InvalidUrl => "Pass an absolute URL or a valid handle",
            ErrorKind::ElementNotFound => "Check the selector against the current page",
            ErrorKind::ProfileNotFound => "Check the spelling of the account or page",
            ErrorKind::LoginRequired => "Log in to the site in the connected browser",
            ErrorKind::AccountSuspended => "The account or community is suspended or banned",
            ErrorKind::PrivateContent => "Follow the account or request access first",
            ErrorKind::RateLimited => "Wait a few minutes before retrying",
            ErrorKind::ScriptExecutionFailed => "Fix the script error and retry",
            ErrorKind::ScriptResultTooLarge => "Return a smaller value from the script",
            ErrorKind::ScreenshotFailed => "Retry without --full-page or on a shorter page",
            ErrorKind::ExtractionFailed => {
                "The page layout was not recognized; the site markup may have changed"
            }
            ErrorKind::ProtocolError => "Unexpected browser protocol error; retry the command",
        }
    }

    /// Whether retrying the same call later may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorKind::ConnectionRefused
                | ErrorKind::ConnectionTimeout
                | ErrorKind::ConnectionFailed
                | ErrorKind::RateLimited
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

impl ScrapeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ScrapeError::Relay(e) => match e.kind() {
                RelayErrorKind::ConnectionRefused => ErrorKind::ConnectionRefused,
                RelayErrorKind::ConnectionTimeout => ErrorKind::ConnectionTimeout,
                RelayErrorKind::ConnectionFailed => ErrorKind::ConnectionFailed,
                RelayErrorKind::NoPagesAvailable => ErrorKind::NoPagesAvailable,
                RelayErrorKind::InvalidPageIndex => ErrorKind::InvalidPageIndex,
                RelayErrorKind::Protocol => ErrorKind::ProtocolError,
            },
            ScrapeError::NavigationTimeout { .. } => ErrorKind::NavigationTimeout,
            ScrapeError::NavigationFailed(_) => ErrorKind::NavigationFailed,
            ScrapeError::InvalidUrl(_) => ErrorKind::InvalidUrl,
            ScrapeError::ElementNotFound(_) => ErrorKind::ElementNotFound,
            ScrapeError::ProfileNotFound(_) => ErrorKind::ProfileNotFound,
            ScrapeError::LoginRequired(_) => ErrorKind::LoginRequired,
            ScrapeError::AccountSuspended(_) => ErrorKind::AccountSuspended,
            ScrapeError::PrivateContent(_) => ErrorKind::PrivateContent,
            ScrapeError::RateLimited(_) => ErrorKind::RateLimited,
            ScrapeError::ScriptExecutionFailed(_) => ErrorKind::ScriptExecutionFailed,
            ScrapeError::ScriptResultTooLarge { .. } => ErrorKind::ScriptResultTooLarge,
            ScrapeError::ScreenshotFailed(_) => ErrorKind::ScreenshotFailed,
            ScrapeError::ExtractionFailed(_) => ErrorKind::ExtractionFailed,
            ScrapeError::Cdp(e) => match e {
                CdpError::ConnectionRefused(_) => ErrorKind::ConnectionRefused,
                CdpError::ConnectionFailed(_)
                | CdpError::WebSocket(_)
                | CdpError::SessionClosed => ErrorKind::ConnectionFailed,
                CdpError::Timeout(_) => ErrorKind::ConnectionTimeout,
                CdpError::NavigationFailed(_) => ErrorKind::NavigationFailed,
                CdpError::JavaScript(_)
                | CdpError::Serialization(_)
                | CdpError::InvalidResponse(_) => ErrorKind::ExtractionFailed,
                CdpError::Protocol { .. } | CdpError::Http(_) => ErrorKind::ProtocolError,
            },
        }
    }
}
