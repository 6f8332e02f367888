//! Tweet type classification.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// `1/5`, `15/20`, `1/`, `1.5`, `(1/5)`, `(2.3)` at the start of the text.
static NUMBERED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\(?\d+(?:/\d*|\.\d+)\)?").expect("thread numbering pattern is valid")
});
static THREAD_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^thread\b").expect("thread keyword pattern is valid"));
static REPLYING_TO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)replying to\s*@?([A-Za-z0-9_]*)").expect("replying-to pattern is valid")
});

const THREAD_EMOJI: char = '🧵';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TweetType {
    Original,
    Reply,
    Retweet,
    Thread,
}

/// Layout cues read from a rendered tweet.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TweetMarkers {
    /// Banner above the tweet, e.g. "Jane reposted".
    pub social_context: Option<String>,
    /// Raw "Replying to @x" line.
    pub replying_to: Option<String>,
    /// A "Show this thread" link.
    pub show_thread_link: bool,
    /// A `card.layoutLarge.detail` card.
    pub large_detail_card: bool,
    /// A "Show more" expander on the tweet text.
    pub show_more: bool,
}

impl TweetMarkers {
    /// Handle from the "Replying to" line. `Some("")` when the line has no handle.
    pub fn reply_target(&self) -> Option<String> {
        let line = self.replying_to.as_deref()?;
        REPLYING_TO
            .captures(line)
            .map(|caps| caps[1].to_string())
            .or_else(|| Some(String::new()))
    }

    fn is_repost(&self) -> bool {
        self.social_context
            .as_deref()
            .is_some_and(|c| c.to_lowercase().contains("reposted"))
    }

    fn has_thread_layout(&self) -> bool {
        self.show_thread_link || self.large_detail_card || self.show_more
    }
}

/// Numbering, a leading "thread" keyword or the thread emoji.
pub fn has_thread_indicator(text: &str) -> bool {
    let text = text.trim_start();
    NUMBERED.is_match(text) || THREAD_KEYWORD.is_match(text) || text.contains(THREAD_EMOJI)
}

/// Classify a tweet written by `as_user`. The first matching rule wins:
/// repost, reply (a self-reply counts as a thread), thread cues, original.
pub fn classify_tweet(text: &str, markers: &TweetMarkers, as_user: &str) -> TweetType {
    if markers.is_repost() {
        return TweetType::Retweet;
    }

    if let Some(target) = markers.reply_target() {
        let as_user = as_user.trim().trim_start_matches('@');
        if !as_user.is_empty() && target.eq_ignore_ascii_case(as_user) {
            return TweetType::Thread;
        }
        return TweetType::Reply;
    }

    if has_thread_indicator(text) || markers.has_thread_layout() {
        return TweetType::Thread;
    }

    TweetType::Original
}

#[cfg(test)]
mod tests {
    use super::*;

    fn replying(line: &str) -> TweetMarkers {
        TweetMarkers {
            replying_to: Some(line.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_numbered_indicators() {
        assert!(has_thread_indicator("1/5 This is the first tweet"));
        assert!(has_thread_indicator("15/20 Still going"));
        assert!(has_thread_indicator("1.5 This uses a dot"));
        assert!(has_thread_indicator("1/ The opener"));
        assert!(has_thread_indicator("(1/5) First tweet"));
        assert!(has_thread_indicator("(2.3) Second tweet"));
        assert!(has_thread_indicator("   2/3 with leading spaces"));
    }

    #[test]
    fn test_keyword_and_emoji_indicators() {
        assert!(has_thread_indicator("Thread: how we ship"));
        assert!(has_thread_indicator("THREAD on compilers"));
        assert!(has_thread_indicator("A long story 🧵"));
        assert!(has_thread_indicator("🧵👇"));
    }

    #[test]
    fn test_plain_text_is_not_a_thread() {
        assert!(!has_thread_indicator("Regular tweet without thread indicators"));
        assert!(!has_thread_indicator("Random numbers 123 456"));
        assert!(!has_thread_indicator("Just a normal tweet"));
        assert!(!has_thread_indicator("Threadbare arguments"));
        assert!(!has_thread_indicator(""));
    }

    #[test]
    fn test_repost_wins() {
        let markers = TweetMarkers {
            social_context: Some("Jane reposted".into()),
            replying_to: Some("Replying to @someone".into()),
            ..Default::default()
        };
        assert_eq!(classify_tweet("1/5 thread", &markers, "someone"), TweetType::Retweet);
    }

    #[test]
    fn test_self_reply_is_thread() {
        assert_eq!(
            classify_tweet("continuing", &replying("Replying to @MyUsername"), "myusername"),
            TweetType::Thread
        );
    }

    #[test]
    fn test_reply_to_other_user() {
        assert_eq!(
            classify_tweet("nice", &replying("Replying to @someone"), "myusername"),
            TweetType::Reply
        );
    }

    #[test]
    fn test_reply_without_handle() {
        let markers = replying("Replying to");
        assert_eq!(markers.reply_target().as_deref(), Some(""));
        assert_eq!(classify_tweet("hm", &markers, "myusername"), TweetType::Reply);
    }

    #[test]
    fn test_reply_with_empty_author() {
        assert_eq!(
            classify_tweet("hm", &replying("Replying to @someone"), ""),
            TweetType::Reply
        );
    }

    #[test]
    fn test_reply_rule_precedes_text_cues() {
        assert_eq!(
            classify_tweet("1/ agreed", &replying("Replying to @someone"), "me"),
            TweetType::Reply
        );
    }

    #[test]
    fn test_layout_markers_make_a_thread() {
        let show_thread = TweetMarkers {
            show_thread_link: true,
            ..Default::default()
        };
        assert_eq!(classify_tweet("hello", &show_thread, "me"), TweetType::Thread);

        let card = TweetMarkers {
            large_detail_card: true,
            ..Default::default()
        };
        assert_eq!(classify_tweet("hello", &card, "me"), TweetType::Thread);

        let show_more = TweetMarkers {
            show_more: true,
            ..Default::default()
        };
        assert_eq!(classify_tweet("hello", &show_more, "me"), TweetType::Thread);
    }

    #[test]
    fn test_original() {
        let none = TweetMarkers::default();
        assert_eq!(classify_tweet("Just a normal tweet", &none, "me"), TweetType::Original);
        assert_eq!(classify_tweet("", &none, ""), TweetType::Original);
    }

    #[test]
    fn test_type_serializes_lowercase() {
        assert_eq!(serde_json::to_value(TweetType::Retweet).unwrap(), "retweet");
    }
}
