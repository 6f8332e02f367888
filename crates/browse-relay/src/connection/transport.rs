//! Transport seam between the manager and the CDP client.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::cdp::CdpError;
use crate::page::PageHandle;

/// Opens relay connections.
#[async_trait]
pub trait RelayConnector: Send + Sync {
    async fn connect(&self, endpoint: &str) -> Result<Arc<dyn RelayBrowser>, CdpError>;
}

/// A live connection to the remote browser.
#[async_trait]
pub trait RelayBrowser: Send + Sync {
    /// Every page target across all browser contexts, in target order.
    async fn pages(&self) -> Result<Vec<Arc<dyn PageHandle>>, CdpError>;

    fn is_connected(&self) -> bool;

    /// Flips to `true` once the transport is gone.
    fn closed(&self) -> watch::Receiver<bool>;

    async fn close(&self);
}
