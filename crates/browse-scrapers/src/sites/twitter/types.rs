//! X/Twitter records.

use serde::{Deserialize, Serialize};

use super::classify::{TweetMarkers, TweetType};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TwitterProfile {
    pub username: String,
    pub display_name: String,
    pub bio: String,
    pub location: Option<String>,
    pub website: Option<String>,
    pub join_date: Option<String>,
    pub followers_count: u64,
    pub following_count: u64,
    pub posts_count: u64,
    pub verified: bool,
    /// Posts are only visible to approved followers.
    pub protected: bool,
    pub profile_image_url: Option<String>,
    pub banner_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TweetAuthor {
    pub username: String,
    pub display_name: String,
    pub profile_image_url: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TweetMetrics {
    pub replies: u64,
    pub retweets: u64,
    pub likes: u64,
    pub views: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Gif,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    #[serde(rename = "type")]
    pub kind: MediaKind,
    pub url: String,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
}

/// A tweet embedded in another one.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuotedTweet {
    pub id: Option<String>,
    pub url: Option<String>,
    pub text: String,
    pub author: TweetAuthor,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Tweet {
    /// Status id; `None` when the permalink was not rendered.
    pub id: Option<String>,
    pub url: Option<String>,
    pub text: String,
    pub author: TweetAuthor,
    pub created_at: Option<String>,
    pub metrics: TweetMetrics,
    pub media: Vec<Media>,
    #[serde(rename = "type")]
    pub tweet_type: TweetType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quoted_tweet: Option<QuotedTweet>,
    /// Handle this tweet replies to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_reply_to: Option<String>,
}

/// A status page: the focal tweet with its conversation.
#[derive(Debug, Clone, Serialize)]
pub struct TweetWithContext {
    #[serde(flatten)]
    pub tweet: Tweet,
    /// Same-author tweets before and directly after the focal one, in order.
    pub thread: Vec<Tweet>,
    pub replies: Vec<Tweet>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResults {
    pub query: String,
    pub tweets: Vec<Tweet>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTimeline {
    pub list_id: String,
    pub tweets: Vec<Tweet>,
    pub has_more: bool,
}

/// Profile fields as read from the page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawProfile {
    pub display_name: String,
    pub bio: String,
    pub location: Option<String>,
    pub website: Option<String>,
    pub join_date: Option<String>,
    pub followers: String,
    pub following: String,
    pub posts: String,
    pub verified: bool,
    pub protected: bool,
    pub profile_image_url: Option<String>,
    pub banner_image_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawAuthor {
    pub handle: String,
    pub name: String,
    pub avatar: Option<String>,
    pub verified: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawQuoted {
    pub id: Option<String>,
    pub url: Option<String>,
    pub text: String,
    pub author: RawAuthor,
}

/// One rendered tweet article.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawTweet {
    pub id: Option<String>,
    pub url: Option<String>,
    pub text: String,
    pub author: RawAuthor,
    pub datetime: Option<String>,
    pub time_text: Option<String>,
    pub replies: String,
    pub retweets: String,
    pub likes: String,
    pub views: String,
    pub media: Vec<Media>,
    pub quoted: Option<RawQuoted>,
    pub markers: TweetMarkers,
}
