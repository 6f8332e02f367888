//! Sentinel phrases that identify error pages.

use crate::error::ScrapeError;

use super::Site;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Sentinel {
    NotFound,
    Suspended,
    Private,
    RateLimited,
    Login,
}

impl Sentinel {
    /// Checked in this order; the first matching phrase wins.
    const ORDER: [Sentinel; 5] = [
        Sentinel::NotFound,
        Sentinel::Suspended,
        Sentinel::Private,
        Sentinel::RateLimited,
        Sentinel::Login,
    ];

    fn into_error(self, site: Site, subject: &str) -> ScrapeError {
        let detail = format!("{} {}", site, subject);
        match self {
            Sentinel::NotFound => ScrapeError::ProfileNotFound(detail),
            Sentinel::Suspended => ScrapeError::AccountSuspended(detail),
            Sentinel::Private => ScrapeError::PrivateContent(detail),
            Sentinel::RateLimited => ScrapeError::RateLimited(detail),
            Sentinel::Login => ScrapeError::LoginRequired(detail),
        }
    }
}

fn phrases(site: Site, sentinel: Sentinel) -> &'static [&'static str] {
    match (site, sentinel) {
        (Site::Twitter, Sentinel::NotFound) => {
            &["This account doesn’t exist", "This account doesn't exist"]
        }
        (Site::Twitter, Sentinel::Suspended) => &["Account suspended"],
        (Site::Twitter, Sentinel::Private) => &[
            "These posts are protected",
            "These Tweets are protected",
        ],
        (Site::Twitter, Sentinel::RateLimited) => &["Rate limit exceeded"],
        (Site::Twitter, Sentinel::Login) => &["Sign in to X", "Log in to X", "Sign in to Twitter"],

        (Site::LinkedIn, Sentinel::NotFound) => &["Page not found", "profile is not available"],
        (Site::LinkedIn, Sentinel::Suspended) => &["This account has been restricted"],
        (Site::LinkedIn, Sentinel::Private) => &[],
        (Site::LinkedIn, Sentinel::RateLimited) => &["Too Many Requests"],
        (Site::LinkedIn, Sentinel::Login) => &["Sign in", "Join now"],

        (Site::Reddit, Sentinel::NotFound) => &[
            "Sorry, nobody on Reddit goes by that name",
            "page not found",
        ],
        (Site::Reddit, Sentinel::Suspended) => &[
            "This account has been suspended",
            "This community has been banned",
        ],
        (Site::Reddit, Sentinel::Private) => &["This community is private"],
        (Site::Reddit, Sentinel::RateLimited) => &["Too Many Requests"],
        (Site::Reddit, Sentinel::Login) => &["Log in to continue"],

        (Site::Instagram, Sentinel::NotFound) => &["Sorry, this page isn't available"],
        (Site::Instagram, Sentinel::Suspended) => &[],
        (Site::Instagram, Sentinel::Private) => &["This account is private"],
        (Site::Instagram, Sentinel::RateLimited) => {
            &["Please wait a few minutes before you try again"]
        }
        (Site::Instagram, Sentinel::Login) => &["Log in", "Sign up"],
    }
}

/// First sentinel whose phrase appears in `text`.
pub(crate) fn detect(site: Site, text: &str) -> Option<Sentinel> {
    Sentinel::ORDER
        .into_iter()
        .find(|s| phrases(site, *s).iter().any(|p| text.contains(p)))
}

/// Map page text to an error, if it reads like one of the site's error pages.
pub(crate) fn classify(site: Site, subject: &str, text: &str) -> Option<ScrapeError> {
    detect(site, text).map(|s| s.into_error(site, subject))
}

/// Like [`classify`], limited to sentinels that cannot appear on a healthy
/// page: missing and suspended accounts.
pub(crate) fn classify_loaded(site: Site, subject: &str, text: &str) -> Option<ScrapeError> {
    detect(site, text)
        .filter(|s| matches!(s, Sentinel::NotFound | Sentinel::Suspended))
        .map(|s| s.into_error(site, subject))
}
