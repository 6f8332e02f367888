//! Site-agnostic extraction for arbitrary pages.

use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use browse_relay::{CdpError, PageHandle, PageInfo};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};
use url::Url;

use crate::error::ScrapeError;
use crate::parse::{cap_chars, normalize_page_text, single_line};
use crate::script::{Script, tag};

pub const MAX_TEXT_CHARS: usize = 100_000;
pub const MAX_HTML_CHARS: usize = 50_000;
pub const MAX_LINKS: usize = 100;
pub const MAX_IMAGES: usize = 50;
pub const MAX_SCRIPT_RESULT_BYTES: usize = 1_000_000;
pub const MAX_SCREENSHOT_BYTES: usize = 5 * 1024 * 1024;

static SCRIPT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").expect("script block pattern is valid")
});
static SCRIPT_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?script\b[^>]*>").expect("script tag pattern is valid"));
static IFRAME_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<iframe\b[^>]*>.*?</iframe\s*>").expect("iframe block pattern is valid")
});
static IFRAME_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</?iframe\b[^>]*>").expect("iframe tag pattern is valid"));
static EVENT_HANDLER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\s+on[a-z]+\s*=\s*(?:"[^"]*"|'[^']*'|[^\s>]+)"#)
        .expect("event handler pattern is valid")
});

const SCRAPE_PAGE: Script = Script::new(
    "scrape-page",
    r#"(args) => {
        const SKIP = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE']);
        const root = args.selector === null
            ? (document.querySelector('main')
                || document.querySelector('article')
                || document.querySelector('[role="main"]')
                || document.body)
            : document.querySelector(args.selector);
        if (!root) {
            return { found: false, url: location.href, title: document.title };
        }

        const parts = [];
        const walk = (node) => {
            if (node.nodeType === Node.TEXT_NODE) {
                parts.push(node.textContent);
                return;
            }
            if (node.nodeType !== Node.ELEMENT_NODE || SKIP.has(node.tagName)) {
                return;
            }
            const style = window.getComputedStyle(node);
            if (style.display === 'none' || style.visibility === 'hidden') {
                return;
            }
            const block = style.display !== 'inline';
            if (block) parts.push('\n');
            for (const child of node.childNodes) walk(child);
            if (block) parts.push('\n');
        };
        walk(root);

        // Text comes from the content root; links and images from the whole
        // document unless a selector scopes everything.
        const scope = args.selector === null ? document : root;
        const webTargets = (selector, attr, limit, make) => {
            const seen = new Set();
            const out = [];
            for (const el of scope.querySelectorAll(selector)) {
                const target = el[attr];
                if (!/^https?:/i.test(target || '') || seen.has(target)) continue;
                seen.add(target);
                out.push(make(el));
                if (out.length >= limit) break;
            }
            return out;
        };
        const links = webTargets('a[href]', 'href', args.maxLinks,
            (a) => ({ text: a.textContent || '', href: a.href }));
        const images = webTargets('img[src]', 'src', args.maxImages,
            (img) => ({ alt: img.alt || '', src: img.src }));

        return {
            found: true,
            url: location.href,
            title: document.title,
            text: parts.join(''),
            html: args.selector === null ? null : root.innerHTML,
            links,
            images,
        };
    }"#,
);

/// One hyperlink from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub href: String,
}

/// One image from the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Image {
    pub alt: String,
    pub src: String,
}

/// Result of [`scrape_page`].
#[derive(Debug, Clone, Serialize)]
pub struct PageContent {
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub html: Option<String>,
    pub links: Vec<Link>,
    pub images: Vec<Image>,
}

#[derive(Debug, Deserialize)]
struct RawPage {
    found: bool,
    url: String,
    title: String,
    #[serde(default)]
    text: String,
    #[serde(default)]
    html: Option<String>,
    #[serde(default)]
    links: Vec<Link>,
    #[serde(default)]
    images: Vec<Image>,
}

/// Result of [`navigate`].
#[derive(Debug, Clone, Serialize)]
pub struct NavigateResult {
    pub success: bool,
    pub url: String,
    pub title: String,
}

/// Result of [`take_screenshot`].
#[derive(Debug, Clone, Serialize)]
pub struct Screenshot {
    /// PNG data, base64 encoded.
    pub data: String,
    /// Decoded size in bytes.
    pub size: usize,
}

impl Screenshot {
    pub fn decode(&self) -> Result<Vec<u8>, ScrapeError> {
        STANDARD
            .decode(&self.data)
            .map_err(|e| ScrapeError::ScreenshotFailed(format!("invalid base64: {}", e)))
    }
}

/// Extract readable text, links and images from the page, or from the first
/// element matching `selector`.
pub async fn scrape_page(
    page: &dyn PageHandle,
    selector: Option<&str>,
) -> Result<PageContent, ScrapeError> {
    let raw: RawPage = SCRAPE_PAGE
        .call(
            page,
            json!({
                "selector": selector,
                "maxLinks": MAX_LINKS,
                "maxImages": MAX_IMAGES,
            }),
        )
        .await?;

    if !raw.found {
        return Err(ScrapeError::ElementNotFound(
            selector.unwrap_or("body").to_string(),
        ));
    }

    let links = dedup_by_target(raw.links, |l| &l.href, MAX_LINKS)
        .into_iter()
        .map(|l| Link {
            text: single_line(&l.text),
            href: l.href,
        })
        .collect();
    let images = dedup_by_target(raw.images, |i| &i.src, MAX_IMAGES);

    Ok(PageContent {
        url: raw.url,
        title: raw.title,
        selector: selector.map(str::to_string),
        text: cap_chars(normalize_page_text(&raw.text), MAX_TEXT_CHARS),
        html: raw.html.map(|html| cap_chars(sanitize_html(&html), MAX_HTML_CHARS)),
        links,
        images,
    })
}

/// Keep absolute http(s) targets, first occurrence wins, up to `cap`.
/// The page script already filters; this re-checks what came back.
fn dedup_by_target<T>(items: Vec<T>, target: impl Fn(&T) -> &String, cap: usize) -> Vec<T> {
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| is_web_url(target(item)))
        .filter(|item| seen.insert(target(item).clone()))
        .take(cap)
        .collect()
}

fn is_web_url(raw: &str) -> bool {
    Url::parse(raw)
        .map(|u| matches!(u.scheme(), "http" | "https"))
        .unwrap_or(false)
}

/// Strip script blocks, iframes and inline event handlers.
pub fn sanitize_html(html: &str) -> String {
    let html = SCRIPT_BLOCK.replace_all(html, "");
    let html = SCRIPT_TAG.replace_all(&html, "");
    let html = IFRAME_BLOCK.replace_all(&html, "");
    let html = IFRAME_TAG.replace_all(&html, "");
    EVENT_HANDLER.replace_all(&html, "").into_owned()
}

/// Run caller code as the body of an async function and return its value.
pub async fn execute_script(page: &dyn PageHandle, code: &str) -> Result<Value, ScrapeError> {
    let expression = format!("(async () => {{\n{}\n}})()\n{}", code, tag("exec"));

    let value = page.evaluate(&expression).await.map_err(|e| match e {
        CdpError::JavaScript(msg) => ScrapeError::ScriptExecutionFailed(msg),
        // A long-awaiting script, not a dead relay.
        CdpError::Timeout(msg) => ScrapeError::ScriptExecutionFailed(msg),
        other => other.into(),
    })?;

    let size = serde_json::to_string(&value)
        .map_err(|e| ScrapeError::ScriptExecutionFailed(e.to_string()))?
        .len();
    if size > MAX_SCRIPT_RESULT_BYTES {
        return Err(ScrapeError::ScriptResultTooLarge {
            size,
            max: MAX_SCRIPT_RESULT_BYTES,
        });
    }

    debug!("Script returned {} bytes", size);
    Ok(value)
}

/// Reject anything that is not an absolute, navigable URL.
pub(crate) fn validate_url(raw: &str) -> Result<Url, ScrapeError> {
    let url = Url::parse(raw.trim()).map_err(|_| ScrapeError::InvalidUrl(raw.to_string()))?;
    if url.scheme() == "javascript" || (url.cannot_be_a_base() && url.scheme() != "about") {
        return Err(ScrapeError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}

/// Navigate the tab and wait for the document to become interactive.
pub async fn navigate(
    page: &dyn PageHandle,
    url: &str,
    timeout: Duration,
) -> Result<NavigateResult, ScrapeError> {
    let target = validate_url(url)?;

    info!("Navigating to {}", target);
    page.navigate(target.as_str(), timeout)
        .await
        .map_err(|e| match e {
            CdpError::Timeout(_) => ScrapeError::NavigationTimeout {
                url: target.to_string(),
                timeout_ms: timeout.as_millis() as u64,
            },
            CdpError::NavigationFailed(msg) => ScrapeError::NavigationFailed(msg),
            other => other.into(),
        })?;

    Ok(NavigateResult {
        success: true,
        url: page.url().await?,
        title: page.title().await?,
    })
}

/// URL and title of the tab.
pub async fn page_info(page: &dyn PageHandle) -> Result<PageInfo, ScrapeError> {
    Ok(PageInfo {
        url: page.url().await?,
        title: page.title().await?,
    })
}

/// Capture the viewport, or the whole document with `full_page`.
pub async fn take_screenshot(
    page: &dyn PageHandle,
    full_page: bool,
) -> Result<Screenshot, ScrapeError> {
    let data = page
        .screenshot(full_page)
        .await
        .map_err(|e| ScrapeError::ScreenshotFailed(e.to_string()))?;

    let mut shot = Screenshot { data, size: 0 };
    shot.size = shot.decode()?.len();
    if shot.size > MAX_SCREENSHOT_BYTES {
        return Err(ScrapeError::ScreenshotFailed(format!(
            "Screenshot too large: {} bytes (max {})",
            shot.size, MAX_SCREENSHOT_BYTES
        )));
    }
    Ok(shot)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_scripts() {
        let html = r#"<p>hi</p><script type="text/javascript">alert("x")</script><SCRIPT>y()</SCRIPT>"#;
        assert_eq!(sanitize_html(html), "<p>hi</p>");
    }

    #[test]
    fn test_sanitize_removes_event_handlers() {
        let html = r#"<a href="/x" onclick="steal()" onMouseOver='x()'>go</a><img src="a.png" onerror=boom()>"#;
        assert_eq!(sanitize_html(html), r#"<a href="/x">go</a><img src="a.png">"#);
    }

    #[test]
    fn test_sanitize_removes_iframes() {
        let html = r#"<div><iframe src="https://ads.example"></iframe><iframe src="x"/></div>"#;
        assert_eq!(sanitize_html(html), "<div></div>");
    }

    #[test]
    fn test_sanitize_keeps_plain_markup() {
        let html = r#"<section class="online"><h2>Notes</h2></section>"#;
        assert_eq!(sanitize_html(html), html);
    }

    #[test]
    fn test_dedup_by_target() {
        let links = vec![
            Link { text: "a".into(), href: "https://a.example/".into() },
            Link { text: "rel".into(), href: "/relative".into() },
            Link { text: "mail".into(), href: "mailto:x@example.com".into() },
            Link { text: "a again".into(), href: "https://a.example/".into() },
            Link { text: "b".into(), href: "http://b.example/".into() },
        ];
        let kept = dedup_by_target(links, |l| &l.href, 10);
        let texts: Vec<&str> = kept.iter().map(|l| l.text.as_str()).collect();
        assert_eq!(texts, ["a", "b"]);
    }

    #[test]
    fn test_dedup_by_target_caps() {
        let images: Vec<Image> = (0..80)
            .map(|i| Image { alt: String::new(), src: format!("https://img.example/{}.png", i) })
            .collect();
        assert_eq!(dedup_by_target(images, |i| &i.src, MAX_IMAGES).len(), MAX_IMAGES);
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://example.com/a?b=c").is_ok());
        assert!(validate_url("about:blank").is_ok());
        assert!(matches!(validate_url("/relative"), Err(ScrapeError::InvalidUrl(_))));
        assert!(matches!(validate_url("not a url"), Err(ScrapeError::InvalidUrl(_))));
        assert!(matches!(
            validate_url("javascript:alert(1)"),
            Err(ScrapeError::InvalidUrl(_))
        ));
        assert!(matches!(validate_url("mailto:a@b.c"), Err(ScrapeError::InvalidUrl(_))));
    }
}
