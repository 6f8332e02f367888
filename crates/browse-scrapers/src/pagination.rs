//! Scroll-driven pagination with de-duplication.
//!
//! [`collect`] alternates extraction and advancing (a site hook, otherwise a
//! scroll) until enough unique items were gathered or the page stopped
//! growing `max_no_growth` times in a row.

use std::collections::HashSet;
use std::time::Duration;

use async_trait::async_trait;
use browse_relay::PageHandle;
use serde::Serialize;
use serde_json::json;
use tracing::debug;

use crate::error::ScrapeError;
use crate::script::Script;

const SCROLL_HEIGHT: Script = Script::new(
    "scroll-height",
    r#"() => Math.max(
        document.body ? document.body.scrollHeight : 0,
        document.documentElement ? document.documentElement.scrollHeight : 0
    )"#,
);

const SCROLL: Script = Script::new(
    "scroll",
    r#"(args) => {
        if (args.by === null) {
            window.scrollTo(0, Math.max(
                document.body ? document.body.scrollHeight : 0,
                document.documentElement ? document.documentElement.scrollHeight : 0
            ));
        } else {
            window.scrollBy(0, args.by);
        }
        return null;
    }"#,
);

/// How a single scroll step moves the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollMode {
    ToBottom,
    /// Scroll by a fixed number of pixels.
    By(u32),
}

/// Pacing for one paginated collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrollPolicy {
    /// Wait after each scroll before measuring again.
    pub settle_delay: Duration,
    /// Consecutive non-growing steps before giving up.
    pub max_no_growth: u32,
    pub mode: ScrollMode,
}

impl ScrollPolicy {
    /// Quick check for a little more content.
    pub fn fast() -> Self {
        Self {
            settle_delay: Duration::from_millis(1500),
            max_no_growth: 3,
            mode: ScrollMode::ToBottom,
        }
    }

    /// Infinite feeds (X, Reddit, Instagram).
    pub fn feed() -> Self {
        Self {
            settle_delay: Duration::from_millis(1500),
            max_no_growth: 10,
            mode: ScrollMode::ToBottom,
        }
    }

    /// Slower, smaller steps for sites that throttle aggressive scrolling.
    pub fn careful() -> Self {
        Self {
            settle_delay: Duration::from_millis(2000),
            max_no_growth: 10,
            mode: ScrollMode::By(500),
        }
    }

    pub fn exhaustive() -> Self {
        Self {
            settle_delay: Duration::from_millis(1500),
            max_no_growth: 20,
            mode: ScrollMode::ToBottom,
        }
    }

    fn ceiling(&self) -> u32 {
        self.max_no_growth.max(1)
    }
}

impl Default for ScrollPolicy {
    fn default() -> Self {
        Self::feed()
    }
}

/// Items gathered by [`collect`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collection<T> {
    pub items: Vec<T>,
    /// False only when the page stopped growing before `count` was reached.
    pub has_more: bool,
}

/// Site-specific half of a paginated scrape.
#[async_trait]
pub trait Collector: Send + Sync {
    type Item: Send;

    /// Everything currently rendered, in page order. Duplicates are fine.
    async fn extract(&self, page: &dyn PageHandle) -> Result<Vec<Self::Item>, ScrapeError>;

    /// Identity used for de-duplication.
    fn dedup_key(&self, item: &Self::Item) -> String;

    /// Load the next batch. `None` falls back to [`scroll_once`];
    /// `Some(grew)` reports whether new content appeared.
    async fn advance(
        &self,
        _page: &dyn PageHandle,
        _policy: &ScrollPolicy,
    ) -> Result<Option<bool>, ScrapeError> {
        Ok(None)
    }
}

/// Keys already emitted during one collection.
#[derive(Debug, Default)]
pub struct DedupSet {
    seen: HashSet<String>,
}

impl DedupSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a key; `false` when it was already present.
    pub fn insert(&mut self, key: impl Into<String>) -> bool {
        self.seen.insert(key.into())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.seen.contains(key)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Prefix key for items without a stable id.
pub fn text_key(text: &str, n: usize) -> String {
    text.trim().chars().take(n).collect()
}

async fn scroll_height(page: &dyn PageHandle) -> Result<u64, ScrapeError> {
    let height: f64 = SCROLL_HEIGHT.call(page, json!({})).await?;
    Ok(height.max(0.0) as u64)
}

/// Scroll one step and report whether the document grew.
pub async fn scroll_once(page: &dyn PageHandle, policy: &ScrollPolicy) -> Result<bool, ScrapeError> {
    let before = scroll_height(page).await?;

    let by = match policy.mode {
        ScrollMode::ToBottom => None,
        ScrollMode::By(px) => Some(px),
    };
    SCROLL.eval(page, json!({ "by": by })).await?;

    tokio::time::sleep(policy.settle_delay).await;

    let after = scroll_height(page).await?;
    debug!("Scrolled: height {} -> {}", before, after);
    Ok(after > before)
}

/// Scroll until the page grows or the no-growth ceiling is hit.
pub async fn scroll_for_more(
    page: &dyn PageHandle,
    policy: &ScrollPolicy,
) -> Result<bool, ScrapeError> {
    for _ in 0..policy.ceiling() {
        if scroll_once(page, policy).await? {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Gather up to `count` unique items.
pub async fn collect<C: Collector>(
    page: &dyn PageHandle,
    collector: &C,
    count: usize,
    policy: &ScrollPolicy,
) -> Result<Collection<C::Item>, ScrapeError> {
    let ceiling = policy.ceiling();
    let mut seen = DedupSet::new();
    let mut items = Vec::new();
    let mut no_growth = 0;

    while items.len() < count && no_growth < ceiling {
        for item in collector.extract(page).await? {
            if items.len() >= count {
                break;
            }
            if seen.insert(collector.dedup_key(&item)) {
                items.push(item);
            }
        }
        if items.len() >= count {
            break;
        }

        let grew = match collector.advance(page, policy).await? {
            Some(grew) => grew,
            None => scroll_once(page, policy).await?,
        };
        no_growth = if grew { 0 } else { no_growth + 1 };
    }

    debug!("Collected {} item(s), {} scroll(s) without growth", items.len(), no_growth);
    Ok(Collection {
        has_more: no_growth < ceiling,
        items,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        assert_eq!(ScrollPolicy::fast().max_no_growth, 3);
        assert_eq!(ScrollPolicy::feed().settle_delay, Duration::from_millis(1500));
        assert_eq!(ScrollPolicy::careful().mode, ScrollMode::By(500));
        assert_eq!(ScrollPolicy::careful().settle_delay, Duration::from_secs(2));
        assert_eq!(ScrollPolicy::exhaustive().max_no_growth, 20);
        assert_eq!(ScrollPolicy::default(), ScrollPolicy::feed());
    }

    #[test]
    fn test_zero_ceiling_still_runs_once() {
        let policy = ScrollPolicy {
            max_no_growth: 0,
            ..ScrollPolicy::fast()
        };
        assert_eq!(policy.ceiling(), 1);
    }

    #[test]
    fn test_dedup_set() {
        let mut seen = DedupSet::new();
        assert!(seen.is_empty());
        assert!(seen.insert("a"));
        assert!(!seen.insert("a".to_string()));
        assert!(seen.insert("b"));
        assert!(seen.contains("b"));
        assert_eq!(seen.len(), 2);
    }

    #[test]
    fn test_text_key() {
        assert_eq!(text_key("  hello world  ", 5), "hello");
        assert_eq!(text_key("ünïcode", 3), "ünï");
        assert_eq!(text_key("short", 100), "short");
    }
}
