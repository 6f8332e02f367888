//! Relay connection manager.
//!
//! Owns the single relay connection: lazy connect with backoff, current-tab
//! tracking, and an optional delayed reconnect after the relay drops us.

mod manager_core;
mod manager_pages;
mod manager_types;
mod retry;
mod transport;

pub use manager_core::ConnectionManager;
pub use manager_types::{
    ConnectionConfig, ConnectionState, PageInfo, PageSummary, RelayError, RelayErrorKind,
};
pub use retry::with_retry;
pub use transport::{RelayBrowser, RelayConnector};

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
