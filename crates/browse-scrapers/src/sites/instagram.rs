//! Instagram scraper.

use async_trait::async_trait;
use browse_relay::PageHandle;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use super::{Marker, Opened, Site, clamp_count, normalize_handle, open};
use crate::error::ScrapeError;
use crate::options::ScrapeOptions;
use crate::pagination::{Collector, collect};
use crate::parse::{clean_text, parse_leading_count};
use crate::script::Script;

pub const MAX_POSTS: usize = 50;
const HANDLE_MAX_LEN: usize = 30;
const BASE_URL: &str = "https://www.instagram.com";

const PROFILE_MARKER: &str = "header section";
const GRID_MARKER: &str = r#"article a[href*="/p/"], article a[href*="/reel/"]"#;

const PROFILE: Script = Script::new(
    "instagram-profile",
    r#"() => {
        const header = document.querySelector('header section');
        const stats = header
            ? Array.from(header.querySelectorAll('ul li')).map((li) => li.textContent.trim())
            : [];
        const find = (word) => stats.find((s) => s.toLowerCase().includes(word)) || '';
        const name = header ? header.querySelector('h1, h2') : null;
        const bio = header ? header.querySelector('h1 ~ span, div > span[dir="auto"]') : null;
        const link = header ? header.querySelector('a[href^="http"]:not([href*="instagram.com"])') : null;
        const avatar = document.querySelector('header img');
        return {
            fullName: name ? name.textContent.trim() : '',
            bio: bio ? bio.innerText : null,
            website: link ? link.href : null,
            posts: find('post'),
            followers: find('follower'),
            following: find('following'),
            verified: !!document.querySelector('header svg[aria-label="Verified"]'),
            private: document.body.innerText.includes('This account is private'),
            profileImageUrl: avatar ? avatar.src : null,
        };
    }"#,
);

const POSTS: Script = Script::new(
    "instagram-posts",
    r#"() => {
        const ID = /\/(?:p|reel)\/([^/]+)/;
        return Array.from(document.querySelectorAll(
            'article a[href*="/p/"], article a[href*="/reel/"]'
        )).map((a) => {
            const href = a.getAttribute('href') || '';
            const match = href.match(ID);
            if (!match) return null;
            const img = a.querySelector('img');
            const icon = a.querySelector('svg[aria-label]');
            const label = icon ? icon.getAttribute('aria-label') : '';
            return {
                shortcode: match[1],
                href,
                imageUrl: img ? img.src : null,
                caption: img ? img.alt : null,
                label,
            };
        }).filter(Boolean);
    }"#,
);

const STORY_RING: Script = Script::new(
    "instagram-story-ring",
    r#"() => !!document.querySelector(
        'header canvas[class*="story"], header div[role="button"] canvas'
    )"#,
);

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramProfile {
    pub username: String,
    pub full_name: String,
    pub bio: Option<String>,
    pub website: Option<String>,
    pub posts_count: u64,
    pub followers_count: u64,
    pub following_count: u64,
    pub verified: bool,
    pub private: bool,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Image,
    Video,
    Carousel,
}

impl PostKind {
    /// From the grid tile's icon label.
    fn from_label(label: &str) -> Self {
        match label {
            "Video" | "Reel" | "Clip" => PostKind::Video,
            "Carousel" => PostKind::Carousel,
            _ => PostKind::Image,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramPost {
    pub shortcode: String,
    pub url: String,
    #[serde(rename = "type")]
    pub kind: PostKind,
    pub image_url: Option<String>,
    pub caption: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstagramPosts {
    pub username: String,
    pub posts: Vec<InstagramPost>,
    pub has_more: bool,
}

/// Story availability. Story media is not fetched.
#[derive(Debug, Clone, Serialize)]
pub struct InstagramStory {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawProfile {
    full_name: String,
    bio: Option<String>,
    website: Option<String>,
    posts: String,
    followers: String,
    following: String,
    verified: bool,
    private: bool,
    profile_image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawPost {
    shortcode: String,
    href: String,
    image_url: Option<String>,
    caption: Option<String>,
    label: String,
}

pub struct InstagramScraper<'a> {
    page: &'a dyn PageHandle,
    options: ScrapeOptions,
}

impl<'a> InstagramScraper<'a> {
    pub fn new(page: &'a dyn PageHandle, options: ScrapeOptions) -> Self {
        Self { page, options }
    }

    pub async fn scrape_profile(&self, username: &str) -> Result<InstagramProfile, ScrapeError> {
        let handle = normalize_handle(Site::Instagram, username, HANDLE_MAX_LEN, &['.'])?;
        let url = format!("{}/{}/", BASE_URL, handle);

        open(
            self.page,
            &self.options,
            Site::Instagram,
            &url,
            Marker::Profile(PROFILE_MARKER),
            &format!("@{}", handle),
        )
        .await?;

        let raw: RawProfile = PROFILE.call(self.page, json!({})).await?;
        info!("Scraped Instagram profile @{}", handle);

        Ok(InstagramProfile {
            username: handle,
            full_name: raw.full_name,
            bio: raw.bio.map(|b| clean_text(&b)).filter(|s| !s.is_empty()),
            website: raw.website,
            posts_count: parse_leading_count(&raw.posts),
            followers_count: parse_leading_count(&raw.followers),
            following_count: parse_leading_count(&raw.following),
            verified: raw.verified,
            private: raw.private,
            profile_image_url: raw.profile_image_url,
        })
    }

    /// Grid posts, newest first.
    pub async fn scrape_posts(
        &self,
        username: &str,
        count: usize,
    ) -> Result<InstagramPosts, ScrapeError> {
        let handle = normalize_handle(Site::Instagram, username, HANDLE_MAX_LEN, &['.'])?;
        let url = format!("{}/{}/", BASE_URL, handle);

        let opened = open(
            self.page,
            &self.options,
            Site::Instagram,
            &url,
            Marker::Optional(GRID_MARKER),
            &format!("@{}", handle),
        )
        .await?;

        let (posts, has_more) = if opened == Opened::Empty {
            (Vec::new(), false)
        } else {
            let count = clamp_count(count, MAX_POSTS);
            let collection = collect(self.page, &PostCollector, count, &self.options.feed).await?;
            (collection.items, collection.has_more)
        };

        Ok(InstagramPosts {
            username: handle,
            posts,
            has_more,
        })
    }

    /// One entry when the profile shows an active story ring, else none.
    pub async fn scrape_stories(&self, username: &str) -> Result<Vec<InstagramStory>, ScrapeError> {
        let handle = normalize_handle(Site::Instagram, username, HANDLE_MAX_LEN, &['.'])?;
        let url = format!("{}/{}/", BASE_URL, handle);

        open(
            self.page,
            &self.options,
            Site::Instagram,
            &url,
            Marker::Profile(PROFILE_MARKER),
            &format!("@{}", handle),
        )
        .await?;

        let has_ring: bool = STORY_RING.call(self.page, json!({})).await?;
        if !has_ring {
            return Ok(Vec::new());
        }
        Ok(vec![InstagramStory {
            id: "stories-available".to_string(),
            url: format!("{}/stories/{}/", BASE_URL, handle),
        }])
    }
}

struct PostCollector;

#[async_trait]
impl Collector for PostCollector {
    type Item = InstagramPost;

    async fn extract(&self, page: &dyn PageHandle) -> Result<Vec<InstagramPost>, ScrapeError> {
        let raws: Vec<RawPost> = POSTS.call(page, json!({})).await?;
        Ok(raws
            .into_iter()
            .map(|p| InstagramPost {
                url: if p.href.starts_with('/') {
                    format!("{}{}", BASE_URL, p.href)
                } else {
                    p.href
                },
                shortcode: p.shortcode,
                kind: PostKind::from_label(&p.label),
                image_url: p.image_url,
                caption: p.caption.filter(|c| !c.is_empty()),
            })
            .collect())
    }

    fn dedup_key(&self, post: &InstagramPost) -> String {
        post.shortcode.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_kind_from_label() {
        assert_eq!(PostKind::from_label("Reel"), PostKind::Video);
        assert_eq!(PostKind::from_label("Video"), PostKind::Video);
        assert_eq!(PostKind::from_label("Carousel"), PostKind::Carousel);
        assert_eq!(PostKind::from_label(""), PostKind::Image);
    }
}
