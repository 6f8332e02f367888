//! Navigation operations for CDP page session.

use std::time::{Duration, Instant};

use serde_json::json;
use tracing::debug;

use crate::cdp::error::CdpError;

use super::core::PageSession;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

impl PageSession {
    /// Navigate to URL and wait for the document to become interactive.
    pub async fn navigate(&self, url: &str, timeout: Duration) -> Result<String, CdpError> {
        let navigation = async {
            let result = self
                .call("Page.navigate", Some(json!({"url": url})))
                .await?;

            if let Some(error) = result.get("errorText").and_then(|e| e.as_str()) {
                return Err(CdpError::NavigationFailed(format!("{}: {}", url, error)));
            }

            let frame_id = result["frameId"].as_str().unwrap_or("main").to_string();
            self.wait_for_load().await?;
            Ok::<_, CdpError>(frame_id)
        };

        let frame_id = tokio::time::timeout(timeout, navigation)
            .await
            .map_err(|_| {
                CdpError::Timeout(format!(
                    "Navigation to {} timed out after {}ms",
                    url,
                    timeout.as_millis()
                ))
            })??;

        debug!("Navigated to {}", url);
        Ok(frame_id)
    }

    /// Wait for page load.
    pub async fn wait_for_load(&self) -> Result<(), CdpError> {
        loop {
            let result = self.evaluate("document.readyState").await?;

            if let Some(state) = result.as_str() {
                if state == "complete" || state == "interactive" {
                    return Ok(());
                }
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    /// Get current URL.
    pub async fn get_url(&self) -> Result<String, CdpError> {
        let result = self.evaluate("window.location.href").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    /// Get page title.
    pub async fn get_title(&self) -> Result<String, CdpError> {
        let result = self.evaluate("document.title").await?;
        Ok(result.as_str().unwrap_or("").to_string())
    }

    /// Wait for selector to appear. Returns `false` on timeout.
    pub async fn wait_for_selector(
        &self,
        selector: &str,
        timeout: Duration,
    ) -> Result<bool, CdpError> {
        let expression = format!(
            "document.querySelector({}) !== null",
            serde_json::to_string(selector)?
        );
        let start = Instant::now();

        loop {
            if self.evaluate(&expression).await?.as_bool() == Some(true) {
                return Ok(true);
            }

            if start.elapsed() > timeout {
                debug!("Selector '{}' not found within {:?}", selector, timeout);
                return Ok(false);
            }

            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}
