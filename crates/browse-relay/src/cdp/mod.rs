//! Chrome DevTools Protocol (CDP) client implementation.
//!
//! Speaks CDP JSON-RPC over a single WebSocket to the relay. Page targets are
//! attached in flattened mode so every tab shares that one socket.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let client = CdpClient::connect("ws://127.0.0.1:19988").await?;
//! for page in client.pages().await? {
//!     println!("{}", page.url().await?);
//! }
//! ```
//!
//! An `http://` endpoint is resolved through `/json/version` first.

mod client;
mod error;
mod protocol;
mod session;

pub use client::{CdpClient, CdpConnector};
pub use error::CdpError;
pub use protocol::*;
pub use session::PageSession;
