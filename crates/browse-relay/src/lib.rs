//! Relay connection layer for browse.
//!
//! Attaches to the user's already-authenticated browser through a
//! remote-debugging relay speaking CDP over WebSocket. Nothing here launches
//! or owns a browser.
//!
//! ```text
//! ┌──────────────────┐    WebSocket     ┌──────────────┐       ┌──────────────┐
//! │ ConnectionManager│ ◄──────────────► │    relay     │ ◄───► │ user browser │
//! │   (this crate)   │       CDP        │ 127.0.0.1:…  │       │  (logged in) │
//! └──────────────────┘                  └──────────────┘       └──────────────┘
//! ```
//!
//! The manager talks to the transport only through [`RelayConnector`],
//! [`RelayBrowser`] and [`PageHandle`], so the scraping engine and the tests
//! can run against in-memory pages.

pub mod cdp;
pub mod connection;
mod page;

pub use cdp::{CdpClient, CdpConnector, CdpError, PageSession};
pub use connection::{
    ConnectionConfig, ConnectionManager, ConnectionState, PageInfo, PageSummary, RelayBrowser,
    RelayConnector, RelayError, RelayErrorKind, with_retry,
};
pub use page::PageHandle;
