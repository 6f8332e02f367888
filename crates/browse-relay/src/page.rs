//! Page handle abstraction.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::cdp::CdpError;

/// A live reference to one browser tab.
///
/// Handles are cheap to clone behind an `Arc` and are borrowed per call;
/// callers must not run concurrent navigations on the same tab.
#[async_trait]
pub trait PageHandle: Send + Sync {
    /// Stable target id of the tab.
    fn target_id(&self) -> &str;

    /// Current `location.href`.
    async fn url(&self) -> Result<String, CdpError>;

    /// Current `document.title`.
    async fn title(&self) -> Result<String, CdpError>;

    /// Evaluate an expression, awaiting promises and returning the value by JSON.
    async fn evaluate(&self, expression: &str) -> Result<Value, CdpError>;

    /// Navigate and wait until the document is at least `interactive`.
    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), CdpError>;

    /// Poll for a CSS selector. `Ok(false)` when it never appeared.
    async fn wait_for_selector(&self, selector: &str, timeout: Duration)
    -> Result<bool, CdpError>;

    /// PNG screenshot, base64 encoded.
    async fn screenshot(&self, full_page: bool) -> Result<String, CdpError>;
}
