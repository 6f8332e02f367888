//! Count, date and text helpers shared by the site scrapers.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, SecondsFormat, Utc};
use regex::Regex;

static RELATIVE_DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)([smhd])$").expect("relative date pattern is valid"));
static HORIZONTAL_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]+").expect("horizontal whitespace pattern is valid"));
static BLANK_LINES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n+").expect("blank line pattern is valid"));
static SPACE_AROUND_NEWLINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*\n[ \t]*").expect("newline pattern is valid"));
static NEWLINE_RUNS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{3,}").expect("newline run pattern is valid"));
static ANY_WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Parse a displayed count such as `"12.5K"`, `"1.2M"`, `"1,234"` or `"2.5b"`.
///
/// Anything unparsable yields 0.
pub fn parse_count(text: &str) -> u64 {
    let cleaned: String = text.trim().chars().filter(|c| *c != ',').collect();

    let multiplier = match cleaned.chars().last().map(|c| c.to_ascii_uppercase()) {
        Some('K') => Some(1_000.0),
        Some('M') => Some(1_000_000.0),
        Some('B') => Some(1_000_000_000.0),
        _ => None,
    };

    if let Some(multiplier) = multiplier {
        let number = cleaned[..cleaned.len() - 1].trim();
        return match number.parse::<f64>() {
            Ok(n) if n.is_finite() && n >= 0.0 => (n * multiplier).round() as u64,
            _ => 0,
        };
    }

    let digits: String = cleaned.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// [`parse_count`] applied to the first word, for labels like `"1,234 posts"`.
pub fn parse_leading_count(text: &str) -> u64 {
    text.split_whitespace().next().map(parse_count).unwrap_or(0)
}

/// Parse a short relative age (`"30s"`, `"5m"`, `"2h"`, `"1d"`) or a
/// calendar date into an RFC 3339 timestamp.
pub fn parse_relative_date(text: &str) -> Option<String> {
    parse_relative_date_at(text, Utc::now())
}

/// [`parse_relative_date`] against an explicit clock.
pub fn parse_relative_date_at(text: &str, now: DateTime<Utc>) -> Option<String> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(caps) = RELATIVE_DATE.captures(text) {
        let amount: i64 = caps[1].parse().ok()?;
        let delta = match &caps[2] {
            "s" => Duration::try_seconds(amount)?,
            "m" => Duration::try_minutes(amount)?,
            "h" => Duration::try_hours(amount)?,
            _ => Duration::try_days(amount)?,
        };
        return Some(format_timestamp(now.checked_sub_signed(delta)?));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(format_timestamp(dt.with_timezone(&Utc)));
    }

    const DATE_FORMATS: &[&str] = &["%b %d, %Y", "%B %d, %Y", "%Y-%m-%d", "%d %b %Y"];
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(format_date(date));
        }
    }

    // Same-year dates are shown without the year ("Jan 15").
    let with_year = format!("{} {}", text, now.year());
    for format in ["%b %d %Y", "%B %d %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, format) {
            return Some(format_date(date));
        }
    }

    None
}

fn format_timestamp(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_date(date: NaiveDate) -> String {
    format_timestamp(date.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc())
}

/// Collapse spaces and tabs, squeeze blank lines to one newline and trim.
pub fn clean_text(text: &str) -> String {
    let collapsed = HORIZONTAL_RUNS.replace_all(text, " ");
    BLANK_LINES.replace_all(&collapsed, "\n").trim().to_string()
}

/// Normalize extracted page text: horizontal runs become one space, spaces
/// around newlines go, three or more newlines become exactly two.
pub fn normalize_page_text(text: &str) -> String {
    let text = HORIZONTAL_RUNS.replace_all(text, " ");
    let text = SPACE_AROUND_NEWLINE.replace_all(&text, "\n");
    NEWLINE_RUNS.replace_all(&text, "\n\n").trim().to_string()
}

/// Collapse every whitespace run, newlines included, to one space.
pub fn single_line(text: &str) -> String {
    ANY_WHITESPACE.replace_all(text, " ").trim().to_string()
}

/// Shorten to at most `max` characters, ending in `...` when cut.
pub fn truncate_text(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = text.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Cut to at most `max` characters without a marker.
pub(crate) fn cap_chars(text: String, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text,
    }
}
