//! Core session struct and CDP command dispatch.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::debug;

use crate::cdp::client::CdpChannel;
use crate::cdp::error::CdpError;
use crate::cdp::protocol::{LayoutMetrics, ScreenshotFormat, Viewport};
use crate::page::PageHandle;

/// A session attached to a single page/target.
pub struct PageSession {
    /// Target ID.
    pub(super) target_id: String,
    /// Session ID for this target.
    pub(super) session_id: String,
    /// Socket shared with the client.
    pub(super) channel: Arc<CdpChannel>,
}

impl PageSession {
    /// Create a new page session.
    pub(crate) fn new(target_id: String, session_id: String, channel: Arc<CdpChannel>) -> Self {
        Self {
            target_id,
            session_id,
            channel,
        }
    }

    /// Get target ID.
    pub fn target_id(&self) -> &str {
        &self.target_id
    }

    /// Get session ID.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send a CDP command to this page session.
    pub async fn call(&self, method: &str, params: Option<Value>) -> Result<Value, CdpError> {
        self.channel
            .call(method, params, Some(&self.session_id))
            .await
    }

    /// Enable required CDP domains.
    pub(crate) async fn enable_domains(&self) -> Result<(), CdpError> {
        self.call("Page.enable", None).await?;
        self.call("Runtime.enable", None).await?;

        debug!("Enabled CDP domains for session {}", self.session_id);
        Ok(())
    }

    /// Take a PNG screenshot, base64 encoded.
    ///
    /// A full-page capture clips to the document size reported by
    /// `Page.getLayoutMetrics`.
    pub async fn screenshot(&self, full_page: bool) -> Result<String, CdpError> {
        let mut params = json!({
            "format": ScreenshotFormat::Png,
            "captureBeyondViewport": full_page,
        });

        if full_page {
            let metrics = self.call("Page.getLayoutMetrics", None).await?;
            let metrics: LayoutMetrics = serde_json::from_value(metrics)?;
            if let Some(size) = metrics.document_size() {
                let clip = Viewport {
                    x: 0.0,
                    y: 0.0,
                    width: size.width,
                    height: size.height,
                    scale: 1.0,
                };
                params["clip"] = serde_json::to_value(clip)?;
            }
        }

        let result = self.call("Page.captureScreenshot", Some(params)).await?;

        result["data"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| CdpError::InvalidResponse("Missing screenshot data".to_string()))
    }
}

#[async_trait]
impl PageHandle for PageSession {
    fn target_id(&self) -> &str {
        &self.target_id
    }

    async fn url(&self) -> Result<String, CdpError> {
        self.get_url().await
    }

    async fn title(&self) -> Result<String, CdpError> {
        self.get_title().await
    }

    async fn evaluate(&self, expression: &str) -> Result<Value, CdpError> {
        PageSession::evaluate(self, expression).await
    }

    async fn navigate(&self, url: &str, timeout: Duration) -> Result<(), CdpError> {
        PageSession::navigate(self, url, timeout).await.map(|_| ())
    }

    async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, CdpError> {
        PageSession::wait_for_selector(self, selector, timeout).await
    }

    async fn screenshot(&self, full_page: bool) -> Result<String, CdpError> {
        PageSession::screenshot(self, full_page).await
    }
}
