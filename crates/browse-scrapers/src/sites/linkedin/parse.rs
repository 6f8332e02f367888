//! LinkedIn label parsing.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static CONNECTIONS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d[\d,]*\+?)").expect("connection count pattern is valid"));
static FOLLOWERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"([\d,.]+)([KM]?)").expect("follower count pattern is valid"));

/// Degree badge of a search result: `1st`, `2nd`, `3rd` or `Out of Network`.
pub fn parse_connection_degree(text: &str) -> String {
    for degree in ["1st", "2nd", "3rd"] {
        if text.contains(degree) {
            return degree.to_string();
        }
    }
    "Out of Network".to_string()
}

/// Dates and total of an experience entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DurationRange {
    pub start: String,
    pub end: String,
    pub total: Option<String>,
}

/// Split `"Jan 2020 - Present · 4 yrs 2 mos"` into its parts.
pub fn parse_duration(text: &str) -> DurationRange {
    let mut parts = text.split('·').map(str::trim);
    let range = parts.next().unwrap_or_default();
    let total = parts.next().filter(|t| !t.is_empty()).map(str::to_string);

    let mut ends = range.split(" - ").map(str::trim);
    let start = ends.next().unwrap_or_default().to_string();
    let end = ends
        .next()
        .filter(|e| !e.is_empty())
        .unwrap_or("Present")
        .to_string();

    DurationRange { start, end, total }
}

/// `"12,345 followers"` → 12345, `"1.2K"` → 1200, `"3M followers"` → 3000000.
pub fn parse_follower_count(text: &str) -> u64 {
    let Some(caps) = FOLLOWERS.captures(text) else {
        return 0;
    };
    let number: f64 = caps[1].replace(',', "").parse().unwrap_or(0.0);
    let multiplier = match &caps[2] {
        "K" => 1_000.0,
        "M" => 1_000_000.0,
        _ => 1.0,
    };
    (number * multiplier).round() as u64
}

/// Connection label as shown, e.g. `"500+"` from `"500+ connections"`.
pub(super) fn parse_connection_count(text: &str) -> Option<String> {
    CONNECTIONS.captures(text).map(|caps| caps[1].to_string())
}
