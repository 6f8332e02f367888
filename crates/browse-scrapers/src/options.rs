//! Per-call timeouts and scroll pacing, built from the `[scraping]` section.

use std::time::Duration;

use browse_config::ScrapingSection;

use crate::pagination::{ScrollMode, ScrollPolicy};

/// Timeouts and pacing shared by every site scraper.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    /// Bound on reaching `interactive` after `Page.navigate`.
    pub navigation_timeout: Duration,
    /// How long to wait for a site's "loaded" marker.
    pub marker_timeout: Duration,
    /// Pacing for feed-style infinite scroll.
    pub feed: ScrollPolicy,
}

impl Default for ScrapeOptions {
    fn default() -> Self {
        Self::from(&ScrapingSection::default())
    }
}

impl From<&ScrapingSection> for ScrapeOptions {
    fn from(section: &ScrapingSection) -> Self {
        Self {
            navigation_timeout: Duration::from_millis(section.navigation_timeout_ms),
            marker_timeout: Duration::from_millis(section.marker_timeout_ms),
            feed: ScrollPolicy {
                settle_delay: Duration::from_millis(section.settle_delay_ms),
                max_no_growth: section.max_no_growth,
                mode: ScrollMode::ToBottom,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_feed_preset() {
        let options = ScrapeOptions::default();
        assert_eq!(options.navigation_timeout, Duration::from_secs(30));
        assert_eq!(options.marker_timeout, Duration::from_secs(10));
        assert_eq!(options.feed, ScrollPolicy::feed());
    }
}
