//! Per-site scrapers.
//!
//! Every site follows the same shape: build a URL, [`open`] it (navigate,
//! wait for a "loaded" marker, classify error pages by sentinel phrases),
//! then run the site's extraction scripts. Markup knowledge lives only in the
//! site modules' script tables.

use std::fmt;

use browse_relay::PageHandle;
use serde_json::json;
use tracing::debug;

use crate::error::ScrapeError;
use crate::generic;
use crate::options::ScrapeOptions;
use crate::parse::cap_chars;
use crate::script::Script;

pub mod instagram;
pub mod linkedin;
pub mod reddit;
mod sentinel;
pub mod twitter;

pub use instagram::InstagramScraper;
pub use linkedin::LinkedInScraper;
pub use reddit::RedditScraper;
pub use twitter::TwitterScraper;

const VISIBLE_TEXT: Script = Script::new(
    "visible-text",
    r#"() => document.body ? document.body.innerText : ''"#,
);

/// Sentinel matching only needs the top of the page.
const SENTINEL_SCAN_CHARS: usize = 20_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Site {
    Twitter,
    LinkedIn,
    Reddit,
    Instagram,
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Site::Twitter => "X",
            Site::LinkedIn => "LinkedIn",
            Site::Reddit => "Reddit",
            Site::Instagram => "Instagram",
        };
        f.write_str(name)
    }
}

/// The element that proves a page finished rendering.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Marker {
    /// Profile pages: required, and re-checked for not-found/suspended text
    /// after loading.
    Profile(&'static str),
    /// Required; absence without a sentinel is a timeout.
    Content(&'static str),
    /// Result lists that may legitimately be empty.
    Optional(&'static str),
}

impl Marker {
    fn selector(&self) -> &'static str {
        match self {
            Marker::Profile(s) | Marker::Content(s) | Marker::Optional(s) => s,
        }
    }
}

/// Outcome of [`open`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Opened {
    Loaded,
    /// Optional marker never appeared and no error page was recognized.
    Empty,
}

/// Navigate to `url` and wait for `marker`, turning error pages into errors.
///
/// `subject` names what was requested (a handle, a URL) for error messages.
pub(crate) async fn open(
    page: &dyn PageHandle,
    options: &ScrapeOptions,
    site: Site,
    url: &str,
    marker: Marker,
    subject: &str,
) -> Result<Opened, ScrapeError> {
    generic::navigate(page, url, options.navigation_timeout).await?;

    let found = page
        .wait_for_selector(marker.selector(), options.marker_timeout)
        .await?;

    if found {
        if let Marker::Profile(_) = marker {
            let text = visible_text(page).await?;
            if let Some(err) = sentinel::classify_loaded(site, subject, &text) {
                return Err(err);
            }
        }
        return Ok(Opened::Loaded);
    }

    debug!("Marker {} missing on {}", marker.selector(), url);
    let text = visible_text(page).await?;
    if let Some(err) = sentinel::classify(site, subject, &text) {
        return Err(err);
    }

    match marker {
        Marker::Optional(_) => Ok(Opened::Empty),
        Marker::Profile(_) | Marker::Content(_) => Err(ScrapeError::NavigationTimeout {
            url: url.to_string(),
            timeout_ms: options.marker_timeout.as_millis() as u64,
        }),
    }
}

async fn visible_text(page: &dyn PageHandle) -> Result<String, ScrapeError> {
    let text: String = VISIBLE_TEXT.call(page, json!({})).await?;
    Ok(cap_chars(text, SENTINEL_SCAN_CHARS))
}

/// Clamp a requested item count into `1..=max`.
pub(crate) fn clamp_count(count: usize, max: usize) -> usize {
    count.clamp(1, max)
}

/// Strip a leading `@` and validate a handle against the site's charset.
pub(crate) fn normalize_handle(
    site: Site,
    raw: &str,
    max_len: usize,
    extra: &[char],
) -> Result<String, ScrapeError> {
    let handle = raw.trim().trim_start_matches('@');
    let valid = !handle.is_empty()
        && handle.chars().count() <= max_len
        && handle
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || extra.contains(&c));
    if valid {
        Ok(handle.to_string())
    } else {
        Err(ScrapeError::InvalidUrl(format!(
            "'{}' is not a valid {} handle",
            raw, site
        )))
    }
}
