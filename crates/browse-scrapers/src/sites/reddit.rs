//! Reddit scraper.
//!
//! Handles both the `shreddit-*` web-component layout and the older
//! `data-testid` layout; the scripts query both.

use std::sync::LazyLock;

use async_trait::async_trait;
use browse_relay::PageHandle;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;
use url::Url;

use super::{Marker, Opened, Site, clamp_count, normalize_handle, open};
use crate::error::ScrapeError;
use crate::options::ScrapeOptions;
use crate::pagination::{Collector, collect};
use crate::parse::{clean_text, parse_count, parse_leading_count, parse_relative_date};
use crate::script::Script;

pub const MAX_POSTS: usize = 100;
pub const DEFAULT_MAX_COMMENTS: usize = 50;
const BASE_URL: &str = "https://www.reddit.com";

static POST_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/comments/([a-z0-9]+)").expect("post id pattern is valid"));

const USER_MARKER: &str = "main";
const FEED_MARKER: &str = r#"shreddit-post, article, [data-testid="post-container"]"#;
const POST_MARKER: &str = r#"shreddit-post, [data-testid="post-container"], h1"#;

const USER: Script = Script::new(
    "reddit-user",
    r#"() => {
        const text = (sel) => {
            const el = document.querySelector(sel);
            return el ? el.textContent.trim() : null;
        };
        const cake = document.querySelector('[id*="cake"], time');
        const avatar = document.querySelector('img[alt*="avatar"], img[src*="avatar"]');
        return {
            karma: text('[id*="karma"] span, [class*="karma"]') || '',
            cakeDay: cake ? (cake.getAttribute('datetime') || cake.textContent.trim()) : null,
            about: text('[class*="about"], [class*="bio"]'),
            avatarUrl: avatar ? avatar.src : null,
        };
    }"#,
);

const POSTS: Script = Script::new(
    "reddit-posts",
    r#"() => {
        const ID = /\/comments\/([a-z0-9]+)/;
        return Array.from(document.querySelectorAll(
            'article, [data-testid="post-container"], shreddit-post'
        )).map((post) => {
            const text = (sel) => {
                const el = post.querySelector(sel);
                return el ? el.textContent.trim() : null;
            };
            const attr = (name) => post.getAttribute(name);
            const permalink = attr('permalink')
                || (post.querySelector('a[href*="/comments/"]') || {}).href
                || '';
            const match = permalink.match(ID);
            if (!match) return null;

            const author = post.querySelector('a[href*="/user/"]');
            const time = post.querySelector('time, [data-click-id="timestamp"]');
            const image = post.querySelector('img[src*="i.redd.it"], img[src*="preview.redd.it"]');
            const outbound = post.querySelector('a[data-click-id="outbound"]');
            const thumb = post.querySelector('img[src*="thumb"], img[alt="Post image"]');
            return {
                id: match[1],
                permalink,
                subreddit: attr('subreddit-prefixed-name'),
                title: attr('post-title') || text('h3, [slot="title"], a[data-click-id="body"]') || '',
                author: attr('author') || (author ? author.textContent.trim().replace(/^u\//, '') : null),
                score: attr('score') || text('[id*="vote-arrows"] span, [class*="score"], faceplate-number') || '',
                comments: attr('comment-count')
                    || text('a[href*="/comments/"] span, [data-click-id="comments"]') || '',
                created: attr('created-timestamp')
                    || (time ? (time.getAttribute('datetime') || time.textContent.trim()) : null),
                imageUrl: image ? image.src : null,
                hasVideo: !!post.querySelector('video, [data-click-id="media"]'),
                externalUrl: attr('content-href') && !(attr('content-href') || '').includes('reddit.com')
                    ? attr('content-href')
                    : (outbound ? outbound.href : null),
                thumbnailUrl: thumb ? thumb.src : null,
                nsfw: post.hasAttribute('nsfw')
                    || !!post.querySelector('[class*="nsfw"], [aria-label*="NSFW"]'),
                pinned: post.hasAttribute('stickied')
                    || !!post.querySelector('[class*="pinned"], [class*="stickied"]'),
            };
        }).filter(Boolean);
    }"#,
);

const THREAD: Script = Script::new(
    "reddit-thread",
    r#"(args) => {
        const text = (scope, sel) => {
            const el = scope.querySelector(sel);
            return el ? el.textContent.trim() : null;
        };
        const post = document.querySelector('shreddit-post, [data-testid="post-container"]') || document;
        const author = document.querySelector(
            '[data-testid="post-header"] a[href*="/user/"], a[class*="author"]'
        );
        const comments = Array.from(document.querySelectorAll('[data-testid="comment"], shreddit-comment'))
            .slice(0, args.maxComments)
            .map((c) => {
                const idMatch = (c.id || '').match(/comment-(\w+)/)
                    || (c.getAttribute('thingid') || '').match(/t1_(\w+)/);
                const cAuthor = c.getAttribute('author')
                    || text(c, 'a[href*="/user/"]');
                const body = c.querySelector('[slot="comment"], [data-testid="comment-content"], p');
                const time = c.querySelector('time');
                return {
                    id: idMatch ? idMatch[1] : null,
                    author: cAuthor ? cAuthor.replace(/^u\//, '') : null,
                    text: body ? body.innerText : '',
                    score: c.getAttribute('score') || text(c, '[id*="vote-arrows"] span, faceplate-number') || '',
                    depth: parseInt(c.getAttribute('depth') || '0', 10) || 0,
                    created: time ? (time.getAttribute('datetime') || time.textContent.trim()) : null,
                };
            });
        return {
            title: (post.getAttribute && post.getAttribute('post-title'))
                || text(document, 'h1, [slot="title"]') || '',
            author: (post.getAttribute && post.getAttribute('author'))
                || (author ? author.textContent.trim().replace(/^u\//, '') : null),
            subreddit: post.getAttribute ? post.getAttribute('subreddit-prefixed-name') : null,
            content: text(document, '[data-testid="post-content"], [slot="text-body"]'),
            score: (post.getAttribute && post.getAttribute('score')) || '',
            commentCount: (post.getAttribute && post.getAttribute('comment-count')) || '',
            created: post.getAttribute ? post.getAttribute('created-timestamp') : null,
            comments,
        };
    }"#,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Hot,
    New,
    Top,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Hot => "hot",
            SortOrder::New => "new",
            SortOrder::Top => "top",
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hot" => Ok(SortOrder::Hot),
            "new" => Ok(SortOrder::New),
            "top" => Ok(SortOrder::Top),
            other => Err(format!("unknown sort '{}', expected hot, new or top", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditUser {
    pub username: String,
    pub karma: u64,
    pub cake_day: Option<String>,
    pub about: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditPost {
    pub id: String,
    pub url: String,
    pub subreddit: Option<String>,
    pub title: String,
    pub author: String,
    pub score: u64,
    pub comment_count: u64,
    pub created_at: Option<String>,
    pub image_url: Option<String>,
    pub has_video: bool,
    pub external_url: Option<String>,
    pub thumbnail_url: Option<String>,
    pub nsfw: bool,
    pub pinned: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subreddit {
    pub name: String,
    pub sort: SortOrder,
    pub posts: Vec<RedditPost>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditComment {
    pub id: Option<String>,
    pub author: String,
    pub text: String,
    pub score: u64,
    pub depth: u32,
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedditThread {
    pub id: String,
    pub url: String,
    pub subreddit: Option<String>,
    pub title: String,
    pub author: String,
    pub content: Option<String>,
    pub score: u64,
    pub comment_count: u64,
    pub created_at: Option<String>,
    pub comments: Vec<RedditComment>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawUser {
    karma: String,
    cake_day: Option<String>,
    about: Option<String>,
    avatar_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPost {
    id: String,
    permalink: String,
    subreddit: Option<String>,
    title: String,
    author: Option<String>,
    score: String,
    comments: String,
    created: Option<String>,
    image_url: Option<String>,
    has_video: bool,
    external_url: Option<String>,
    thumbnail_url: Option<String>,
    nsfw: bool,
    pinned: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawComment {
    id: Option<String>,
    author: Option<String>,
    text: String,
    score: String,
    depth: u32,
    created: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawThread {
    title: String,
    author: Option<String>,
    subreddit: Option<String>,
    content: Option<String>,
    score: String,
    comment_count: String,
    created: Option<String>,
    comments: Vec<RawComment>,
}

pub struct RedditScraper<'a> {
    page: &'a dyn PageHandle,
    options: ScrapeOptions,
}

impl<'a> RedditScraper<'a> {
    pub fn new(page: &'a dyn PageHandle, options: ScrapeOptions) -> Self {
        Self { page, options }
    }

    pub async fn scrape_user(&self, username: &str) -> Result<RedditUser, ScrapeError> {
        let name = username.trim().trim_start_matches("u/");
        let name = normalize_handle(Site::Reddit, name, 20, &['-'])?;
        let url = format!("{}/user/{}/", BASE_URL, name);

        open(
            self.page,
            &self.options,
            Site::Reddit,
            &url,
            Marker::Profile(USER_MARKER),
            &format!("u/{}", name),
        )
        .await?;

        let raw: RawUser = USER.call(self.page, json!({})).await?;
        info!("Scraped Reddit user u/{}", name);

        Ok(RedditUser {
            username: name,
            karma: parse_leading_count(&raw.karma),
            cake_day: raw.cake_day.filter(|s| !s.is_empty()),
            about: raw.about.map(|a| clean_text(&a)).filter(|s| !s.is_empty()),
            avatar_url: raw.avatar_url,
        })
    }

    pub async fn scrape_subreddit(
        &self,
        name: &str,
        count: usize,
        sort: SortOrder,
    ) -> Result<Subreddit, ScrapeError> {
        let name = name.trim().trim_start_matches("/").trim_start_matches("r/");
        let name = normalize_handle(Site::Reddit, name, 21, &[])?;
        let url = format!("{}/r/{}/{}/", BASE_URL, name, sort.as_str());

        let opened = open(
            self.page,
            &self.options,
            Site::Reddit,
            &url,
            Marker::Optional(FEED_MARKER),
            &format!("r/{}", name),
        )
        .await?;

        let (posts, has_more) = if opened == Opened::Empty {
            (Vec::new(), false)
        } else {
            let count = clamp_count(count, MAX_POSTS);
            let collection = collect(self.page, &PostCollector, count, &self.options.feed).await?;
            (collection.items, collection.has_more)
        };
        info!("Collected {} post(s) from r/{}", posts.len(), name);

        Ok(Subreddit {
            name,
            sort,
            posts,
            has_more,
        })
    }

    /// A post with up to `max_comments` comments in page order.
    pub async fn scrape_post(
        &self,
        post_url: &str,
        max_comments: usize,
    ) -> Result<RedditThread, ScrapeError> {
        let (url, id) = post_url_of(post_url)?;

        open(
            self.page,
            &self.options,
            Site::Reddit,
            &url,
            Marker::Content(POST_MARKER),
            &url,
        )
        .await?;

        let raw: RawThread = THREAD
            .call(self.page, json!({ "maxComments": max_comments }))
            .await?;

        Ok(RedditThread {
            id,
            url,
            subreddit: raw.subreddit,
            title: raw.title,
            author: author_or_deleted(raw.author),
            content: raw.content.map(|c| clean_text(&c)).filter(|s| !s.is_empty()),
            score: parse_count(&raw.score),
            comment_count: parse_count(&raw.comment_count),
            created_at: raw.created.as_deref().and_then(parse_relative_date),
            comments: raw
                .comments
                .into_iter()
                .take(max_comments)
                .map(|c| RedditComment {
                    id: c.id,
                    author: author_or_deleted(c.author),
                    text: clean_text(&c.text),
                    score: parse_leading_count(&c.score),
                    depth: c.depth,
                    created_at: c.created.as_deref().and_then(parse_relative_date),
                })
                .collect(),
        })
    }
}

fn author_or_deleted(author: Option<String>) -> String {
    author
        .filter(|a| !a.is_empty())
        .unwrap_or_else(|| "[deleted]".to_string())
}

/// Validate a post URL; returns the canonical URL and the post id.
fn post_url_of(raw: &str) -> Result<(String, String), ScrapeError> {
    let invalid = || ScrapeError::InvalidUrl(format!("'{}' is not a Reddit post URL", raw));
    if !raw.contains("/comments/") {
        return Err(invalid());
    }
    let mut url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    let id = POST_ID
        .captures(url.path())
        .map(|caps| caps[1].to_string())
        .ok_or_else(invalid)?;
    url.set_query(None);
    url.set_fragment(None);
    Ok((url.to_string(), id))
}

fn absolute(permalink: &str) -> String {
    if permalink.starts_with('/') {
        format!("{}{}", BASE_URL, permalink)
    } else {
        permalink.to_string()
    }
}

struct PostCollector;

#[async_trait]
impl Collector for PostCollector {
    type Item = RedditPost;

    async fn extract(&self, page: &dyn PageHandle) -> Result<Vec<RedditPost>, ScrapeError> {
        let raws: Vec<RawPost> = POSTS.call(page, json!({})).await?;
        Ok(raws
            .into_iter()
            .map(|p| RedditPost {
                url: absolute(&p.permalink),
                id: p.id,
                subreddit: p.subreddit,
                title: p.title,
                author: author_or_deleted(p.author),
                score: parse_count(&p.score),
                comment_count: parse_leading_count(&p.comments),
                created_at: p.created.as_deref().and_then(parse_relative_date),
                image_url: p.image_url,
                has_video: p.has_video,
                external_url: p.external_url,
                thumbnail_url: p.thumbnail_url,
                nsfw: p.nsfw,
                pinned: p.pinned,
            })
            .collect())
    }

    fn dedup_key(&self, post: &RedditPost) -> String {
        post.id.clone()
    }
}
