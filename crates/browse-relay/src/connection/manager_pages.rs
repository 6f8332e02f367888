//! ConnectionManager page operations: listing, selecting, switching tabs.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::debug;

use super::manager_core::ConnectionManager;
use super::{PageInfo, PageSummary, RelayError};
use crate::page::PageHandle;

impl ConnectionManager {
    /// Index of the current tab. May be stale until the next page request.
    pub fn current_index(&self) -> usize {
        self.inner.current_index.load(Ordering::SeqCst)
    }

    /// All page targets. An empty list is valid.
    pub async fn get_pages(&self) -> Result<Vec<Arc<dyn PageHandle>>, RelayError> {
        let browser = self.browser().await?;
        Ok(browser.pages().await?)
    }

    /// The current tab, connecting first if needed.
    pub async fn get_page(&self) -> Result<Arc<dyn PageHandle>, RelayError> {
        let pages = self.get_pages().await?;
        let index = self.heal_index(pages.len())?;
        Ok(pages[index].clone())
    }

    /// Make tab `index` current.
    pub async fn switch_page(&self, index: usize) -> Result<Arc<dyn PageHandle>, RelayError> {
        let pages = self.get_pages().await?;
        if pages.is_empty() {
            return Err(RelayError::NoPagesAvailable);
        }
        if index >= pages.len() {
            return Err(RelayError::InvalidPageIndex {
                index,
                len: pages.len(),
            });
        }

        self.inner.current_index.store(index, Ordering::SeqCst);
        debug!("Switched to tab {}", index);
        Ok(pages[index].clone())
    }

    /// Every tab with its URL, title and whether it is current.
    pub async fn list_pages(&self) -> Result<Vec<PageSummary>, RelayError> {
        let pages = self.get_pages().await?;
        let current = if pages.is_empty() {
            None
        } else {
            Some(self.heal_index(pages.len())?)
        };

        let mut summaries = Vec::with_capacity(pages.len());
        for (index, page) in pages.iter().enumerate() {
            summaries.push(PageSummary {
                index,
                url: page.url().await.unwrap_or_default(),
                title: page.title().await.unwrap_or_default(),
                current: current == Some(index),
            });
        }
        Ok(summaries)
    }

    /// URL and title of the current tab.
    pub async fn page_info(&self) -> Result<PageInfo, RelayError> {
        let page = self.get_page().await?;
        Ok(PageInfo {
            url: page.url().await?,
            title: page.title().await?,
        })
    }

    /// Clamp the current index into `[0, len)`.
    fn heal_index(&self, len: usize) -> Result<usize, RelayError> {
        if len == 0 {
            return Err(RelayError::NoPagesAvailable);
        }

        let index = self.current_index();
        if index < len {
            return Ok(index);
        }

        let healed = len - 1;
        debug!("Tab index {} out of range, clamping to {}", index, healed);
        self.inner.current_index.store(healed, Ordering::SeqCst);
        Ok(healed)
    }
}
