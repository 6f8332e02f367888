//! X/Twitter scraper.

mod classify;
mod scripts;
mod types;

use std::sync::LazyLock;

use async_trait::async_trait;
use browse_relay::PageHandle;
use regex::Regex;
use serde_json::json;
use tracing::info;
use url::Url;

use crate::error::ScrapeError;
use crate::options::ScrapeOptions;
use crate::pagination::{Collector, collect, text_key};
use crate::parse::{parse_leading_count, parse_relative_date};

use super::{Marker, Opened, Site, clamp_count, normalize_handle, open};
use types::{RawAuthor, RawProfile, RawTweet};

pub use classify::{TweetMarkers, TweetType, classify_tweet, has_thread_indicator};
pub use types::{
    ListTimeline, Media, MediaKind, QuotedTweet, SearchResults, Tweet, TweetAuthor, TweetMetrics,
    TweetWithContext, TwitterProfile,
};

pub const MAX_TWEETS: usize = 100;
const HANDLE_MAX_LEN: usize = 15;
const BASE_URL: &str = "https://x.com";

static STATUS_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^/([A-Za-z0-9_]{1,15})/status/(\d+)").expect("status path pattern is valid")
});

pub struct TwitterScraper<'a> {
    page: &'a dyn PageHandle,
    options: ScrapeOptions,
}

impl<'a> TwitterScraper<'a> {
    pub fn new(page: &'a dyn PageHandle, options: ScrapeOptions) -> Self {
        Self { page, options }
    }

    pub async fn scrape_profile(&self, username: &str) -> Result<TwitterProfile, ScrapeError> {
        let handle = normalize_handle(Site::Twitter, username, HANDLE_MAX_LEN, &[])?;
        let url = format!("{}/{}", BASE_URL, handle);
        let subject = format!("@{}", handle);

        open(
            self.page,
            &self.options,
            Site::Twitter,
            &url,
            Marker::Profile(scripts::PROFILE_MARKER),
            &subject,
        )
        .await?;

        let raw: RawProfile = scripts::PROFILE.call(self.page, json!({})).await?;
        info!("Scraped X profile {}", subject);

        Ok(TwitterProfile {
            username: handle,
            display_name: raw.display_name,
            bio: raw.bio,
            location: raw.location.filter(|s| !s.is_empty()),
            website: raw.website.filter(|s| !s.is_empty()),
            join_date: raw.join_date,
            followers_count: parse_leading_count(&raw.followers),
            following_count: parse_leading_count(&raw.following),
            posts_count: parse_leading_count(&raw.posts),
            verified: raw.verified,
            protected: raw.protected,
            profile_image_url: raw.profile_image_url,
            banner_image_url: raw.banner_image_url,
        })
    }

    /// A user's tweets, or the home timeline when `username` is `None`.
    pub async fn scrape_timeline(
        &self,
        username: Option<&str>,
        count: usize,
    ) -> Result<Vec<Tweet>, ScrapeError> {
        let (url, subject) = match username {
            Some(name) => {
                let handle = normalize_handle(Site::Twitter, name, HANDLE_MAX_LEN, &[])?;
                (format!("{}/{}", BASE_URL, handle), format!("@{}", handle))
            }
            None => (format!("{}/home", BASE_URL), "home timeline".to_string()),
        };

        let (tweets, _) = self.collect_feed(&url, &subject, count).await?;
        Ok(tweets)
    }

    /// A status page with its thread and replies.
    pub async fn scrape_post(&self, url: &str) -> Result<TweetWithContext, ScrapeError> {
        let (handle, status_id) = parse_status_url(url)?;
        let canonical = format!("{}/{}/status/{}", BASE_URL, handle, status_id);

        open(
            self.page,
            &self.options,
            Site::Twitter,
            &canonical,
            Marker::Content(scripts::TWEET_MARKER),
            &canonical,
        )
        .await?;

        let raws: Vec<RawTweet> = scripts::TWEETS.call(self.page, json!({})).await?;
        let tweets: Vec<Tweet> = raws.into_iter().map(into_tweet).collect();
        split_conversation(tweets, &status_id).ok_or_else(|| {
            ScrapeError::ExtractionFailed(format!("status {} is not on the page", status_id))
        })
    }

    /// Latest tweets matching `query`.
    pub async fn scrape_search(
        &self,
        query: &str,
        count: usize,
    ) -> Result<SearchResults, ScrapeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScrapeError::InvalidUrl("empty search query".to_string()));
        }
        let url = Url::parse_with_params(
            &format!("{}/search", BASE_URL),
            &[("q", query), ("src", "typed_query"), ("f", "live")],
        )
        .map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;

        let (tweets, has_more) = self
            .collect_feed(url.as_str(), &format!("search '{}'", query), count)
            .await?;
        Ok(SearchResults {
            query: query.to_string(),
            tweets,
            has_more,
        })
    }

    pub async fn scrape_list(
        &self,
        list_id: &str,
        count: usize,
    ) -> Result<ListTimeline, ScrapeError> {
        let list_id = list_id.trim();
        if list_id.is_empty() || !list_id.chars().all(|c| c.is_ascii_digit()) {
            return Err(ScrapeError::InvalidUrl(format!(
                "'{}' is not a list id",
                list_id
            )));
        }
        let url = format!("{}/i/lists/{}", BASE_URL, list_id);

        let (tweets, has_more) = self
            .collect_feed(&url, &format!("list {}", list_id), count)
            .await?;
        Ok(ListTimeline {
            list_id: list_id.to_string(),
            tweets,
            has_more,
        })
    }

    async fn collect_feed(
        &self,
        url: &str,
        subject: &str,
        count: usize,
    ) -> Result<(Vec<Tweet>, bool), ScrapeError> {
        let opened = open(
            self.page,
            &self.options,
            Site::Twitter,
            url,
            Marker::Optional(scripts::TWEET_MARKER),
            subject,
        )
        .await?;
        if opened == Opened::Empty {
            return Ok((Vec::new(), false));
        }

        let count = clamp_count(count, MAX_TWEETS);
        let collection = collect(self.page, &TweetCollector, count, &self.options.feed).await?;
        info!("Collected {} tweet(s) from {}", collection.items.len(), subject);
        Ok((collection.items, collection.has_more))
    }
}

struct TweetCollector;

#[async_trait]
impl Collector for TweetCollector {
    type Item = Tweet;

    async fn extract(&self, page: &dyn PageHandle) -> Result<Vec<Tweet>, ScrapeError> {
        let raws: Vec<RawTweet> = scripts::TWEETS.call(page, json!({})).await?;
        Ok(raws.into_iter().map(into_tweet).collect())
    }

    fn dedup_key(&self, tweet: &Tweet) -> String {
        match &tweet.id {
            Some(id) => id.clone(),
            None => text_key(&tweet.text, 100),
        }
    }
}

/// Accepts `x.com` and `twitter.com` status URLs; returns handle and id.
fn parse_status_url(raw: &str) -> Result<(String, String), ScrapeError> {
    let invalid = || ScrapeError::InvalidUrl(format!("'{}' is not a post URL", raw));

    let url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    let host = url.host_str().unwrap_or_default();
    let known_host = ["x.com", "twitter.com"]
        .iter()
        .any(|h| host == *h || host.ends_with(&format!(".{}", h)));
    if !known_host {
        return Err(invalid());
    }

    let caps = STATUS_PATH.captures(url.path()).ok_or_else(invalid)?;
    Ok((caps[1].to_string(), caps[2].to_string()))
}

fn into_author(raw: RawAuthor) -> TweetAuthor {
    TweetAuthor {
        username: raw.handle,
        display_name: raw.name,
        profile_image_url: raw.avatar,
        verified: raw.verified,
    }
}

fn into_tweet(raw: RawTweet) -> Tweet {
    let tweet_type = classify_tweet(&raw.text, &raw.markers, &raw.author.handle);
    let in_reply_to = raw.markers.reply_target().filter(|t| !t.is_empty());
    let created_at = raw
        .datetime
        .as_deref()
        .and_then(parse_relative_date)
        .or_else(|| raw.time_text.as_deref().and_then(parse_relative_date));

    Tweet {
        id: raw.id,
        url: raw.url,
        text: raw.text,
        author: into_author(raw.author),
        created_at,
        metrics: TweetMetrics {
            replies: parse_leading_count(&raw.replies),
            retweets: parse_leading_count(&raw.retweets),
            likes: parse_leading_count(&raw.likes),
            views: parse_leading_count(&raw.views),
        },
        media: raw.media,
        tweet_type,
        quoted_tweet: raw.quoted.map(|q| QuotedTweet {
            id: q.id,
            url: q.url,
            text: q.text,
            author: into_author(q.author),
        }),
        in_reply_to,
    }
}

/// Split a rendered conversation around the focal status.
///
/// Everything above the focal tweet is context and belongs to the thread, as
/// do same-author tweets directly below it. The rest are replies.
fn split_conversation(tweets: Vec<Tweet>, status_id: &str) -> Option<TweetWithContext> {
    let focal_idx = tweets
        .iter()
        .position(|t| t.id.as_deref() == Some(status_id))?;

    let mut rest = tweets;
    let below = rest.split_off(focal_idx + 1);
    let focal = rest.pop()?;
    let mut thread = rest;

    let author = focal.author.username.to_lowercase();
    let mut replies = Vec::new();
    let mut continuing = true;
    for tweet in below {
        if tweet.id.is_some() && tweet.id == focal.id {
            continue;
        }
        if continuing && tweet.author.username.to_lowercase() == author {
            thread.push(tweet);
        } else {
            continuing = false;
            replies.push(tweet);
        }
    }

    Some(TweetWithContext {
        tweet: focal,
        thread,
        replies,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tweet(id: &str, author: &str) -> Tweet {
        into_tweet(RawTweet {
            id: Some(id.to_string()),
            text: format!("tweet {}", id),
            author: RawAuthor {
                handle: author.to_string(),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    #[test]
    fn test_parse_status_url() {
        let (handle, id) = parse_status_url("https://x.com/rustlang/status/1790000000000000001").unwrap();
        assert_eq!(handle, "rustlang");
        assert_eq!(id, "1790000000000000001");

        let (_, id) = parse_status_url("https://mobile.twitter.com/a_b/status/42?s=20").unwrap();
        assert_eq!(id, "42");

        assert!(parse_status_url("https://x.com/rustlang").is_err());
        assert!(parse_status_url("https://example.com/a/status/1").is_err());
        assert!(parse_status_url("x.com/a/status/1").is_err());
    }

    #[test]
    fn test_into_tweet_parses_metrics_and_type() {
        let raw = RawTweet {
            id: Some("1".into()),
            text: "1/3 a thread".into(),
            author: RawAuthor {
                handle: "me".into(),
                name: "Me".into(),
                ..Default::default()
            },
            datetime: Some("2024-05-01T10:00:00.000Z".into()),
            replies: "12".into(),
            retweets: "1.5K".into(),
            likes: "2M".into(),
            views: "3,400".into(),
            markers: TweetMarkers {
                replying_to: None,
                ..Default::default()
            },
            ..Default::default()
        };
        let tweet = into_tweet(raw);
        assert_eq!(tweet.tweet_type, TweetType::Thread);
        assert_eq!(
            tweet.metrics,
            TweetMetrics {
                replies: 12,
                retweets: 1_500,
                likes: 2_000_000,
                views: 3_400
            }
        );
        assert_eq!(tweet.created_at.as_deref(), Some("2024-05-01T10:00:00.000Z"));
        assert!(tweet.in_reply_to.is_none());
    }

    #[test]
    fn test_into_tweet_records_reply_target() {
        let raw = RawTweet {
            author: RawAuthor {
                handle: "me".into(),
                ..Default::default()
            },
            markers: TweetMarkers {
                replying_to: Some("Replying to @other".into()),
                ..Default::default()
            },
            ..Default::default()
        };
        let tweet = into_tweet(raw);
        assert_eq!(tweet.tweet_type, TweetType::Reply);
        assert_eq!(tweet.in_reply_to.as_deref(), Some("other"));
    }

    #[test]
    fn test_split_conversation() {
        let tweets = vec![
            tweet("1", "alice"),
            tweet("2", "Alice"),
            tweet("3", "alice"),
            tweet("4", "bob"),
            tweet("5", "alice"),
        ];
        let ctx = split_conversation(tweets, "2").unwrap();
        assert_eq!(ctx.tweet.id.as_deref(), Some("2"));
        let thread: Vec<_> = ctx.thread.iter().filter_map(|t| t.id.as_deref()).collect();
        assert_eq!(thread, ["1", "3"]);
        let replies: Vec<_> = ctx.replies.iter().filter_map(|t| t.id.as_deref()).collect();
        assert_eq!(replies, ["4", "5"]);
    }

    #[test]
    fn test_split_conversation_missing_focal() {
        assert!(split_conversation(vec![tweet("1", "a")], "9").is_none());
    }

    #[test]
    fn test_dedup_key_falls_back_to_text() {
        let mut t = tweet("1", "a");
        assert_eq!(TweetCollector.dedup_key(&t), "1");
        t.id = None;
        t.text = "x".repeat(150);
        assert_eq!(TweetCollector.dedup_key(&t).len(), 100);
    }
}
