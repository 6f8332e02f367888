//! LinkedIn scraper.
//!
//! LinkedIn throttles fast scrolling, so feeds use [`ScrollPolicy::careful`]
//! and search pages advance with the "Next" button when it is present.

mod parse;
mod scripts;
mod types;

use async_trait::async_trait;
use browse_relay::PageHandle;
use serde_json::json;
use tracing::{debug, info};
use url::Url;

use crate::error::ScrapeError;
use crate::options::ScrapeOptions;
use crate::pagination::{Collector, ScrollPolicy, collect, text_key};
use crate::parse::{clean_text, truncate_text};

use super::{Marker, Opened, Site, clamp_count, open};
use parse::parse_connection_count;
use types::{RawHit, RawPost, RawProfile};

pub use parse::{DurationRange, parse_connection_degree, parse_duration, parse_follower_count};
pub use types::{
    CompanyHit, Education, Experience, LinkedInPost, LinkedInPosts, LinkedInProfile,
    LinkedInSearchResults, PersonHit, PostAuthor, PostHit, SearchHit, SearchKind,
};

pub const MAX_POSTS: usize = 50;
pub const MAX_SEARCH_RESULTS: usize = 50;
const MAX_EXPERIENCE: usize = 10;
const MAX_EDUCATION: usize = 5;
const MAX_SKILLS: usize = 10;
const POST_HIT_TEXT_CHARS: usize = 200;
const BASE_URL: &str = "https://www.linkedin.com";

pub struct LinkedInScraper<'a> {
    page: &'a dyn PageHandle,
    options: ScrapeOptions,
    policy: ScrollPolicy,
}

impl<'a> LinkedInScraper<'a> {
    pub fn new(page: &'a dyn PageHandle, options: ScrapeOptions) -> Self {
        Self {
            page,
            options,
            policy: ScrollPolicy::careful(),
        }
    }

    /// Override the scroll pacing.
    pub fn with_policy(mut self, policy: ScrollPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub async fn scrape_profile(&self, profile_url: &str) -> Result<LinkedInProfile, ScrapeError> {
        let url = profile_url_of(profile_url)?;

        open(
            self.page,
            &self.options,
            Site::LinkedIn,
            &url,
            Marker::Profile(scripts::PROFILE_MARKER),
            &url,
        )
        .await?;

        let raw: RawProfile = scripts::PROFILE
            .call(
                self.page,
                json!({
                    "maxExperience": MAX_EXPERIENCE,
                    "maxEducation": MAX_EDUCATION,
                    "maxSkills": MAX_SKILLS,
                }),
            )
            .await?;
        info!("Scraped LinkedIn profile {}", url);

        Ok(LinkedInProfile {
            url,
            name: raw.name,
            headline: raw.headline,
            location: raw.location.filter(|s| !s.is_empty()),
            about: raw.about.map(|a| clean_text(&a)).filter(|s| !s.is_empty()),
            profile_image_url: raw.profile_image_url,
            connections: raw.connections.as_deref().and_then(parse_connection_count),
            experience: raw
                .experience
                .into_iter()
                .take(MAX_EXPERIENCE)
                .map(|e| Experience {
                    period: parse_duration(&e.duration),
                    title: e.title,
                    company: e.company,
                    company_url: e.company_url,
                    duration: e.duration,
                    description: e.description.map(|d| clean_text(&d)),
                })
                .collect(),
            education: raw
                .education
                .into_iter()
                .take(MAX_EDUCATION)
                .map(|e| Education {
                    school: e.school,
                    degree: e.degree,
                    dates: e.dates,
                })
                .collect(),
            skills: raw.skills.into_iter().take(MAX_SKILLS).collect(),
        })
    }

    /// Recent activity of a profile.
    pub async fn scrape_posts(
        &self,
        profile_url: &str,
        count: usize,
    ) -> Result<LinkedInPosts, ScrapeError> {
        let profile_url = profile_url_of(profile_url)?;
        let url = format!("{}/recent-activity/all/", profile_url.trim_end_matches('/'));

        let opened = open(
            self.page,
            &self.options,
            Site::LinkedIn,
            &url,
            Marker::Optional(scripts::POST_MARKER),
            &profile_url,
        )
        .await?;
        if opened == Opened::Empty {
            return Ok(LinkedInPosts {
                profile_url,
                posts: Vec::new(),
                has_more: false,
            });
        }

        let count = clamp_count(count, MAX_POSTS);
        let collection = collect(self.page, &PostCollector, count, &self.policy).await?;
        info!("Collected {} LinkedIn post(s)", collection.items.len());

        Ok(LinkedInPosts {
            profile_url,
            posts: collection.items,
            has_more: collection.has_more,
        })
    }

    pub async fn scrape_search(
        &self,
        query: &str,
        kind: SearchKind,
        count: usize,
    ) -> Result<LinkedInSearchResults, ScrapeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ScrapeError::InvalidUrl("empty search query".to_string()));
        }
        let url = Url::parse_with_params(
            &format!("{}/search/results/{}/", BASE_URL, kind.path()),
            &[("keywords", query)],
        )
        .map_err(|e| ScrapeError::InvalidUrl(e.to_string()))?;

        let opened = open(
            self.page,
            &self.options,
            Site::LinkedIn,
            url.as_str(),
            Marker::Optional(scripts::SEARCH_MARKER),
            &format!("search '{}'", query),
        )
        .await?;

        let (results, has_more) = if opened == Opened::Empty {
            (Vec::new(), false)
        } else {
            let count = clamp_count(count, MAX_SEARCH_RESULTS);
            let collection =
                collect(self.page, &SearchCollector { kind }, count, &self.policy).await?;
            (collection.items, collection.has_more)
        };

        Ok(LinkedInSearchResults {
            query: query.to_string(),
            kind,
            results,
            has_more,
        })
    }
}

/// Validate a profile URL and drop its query and fragment.
fn profile_url_of(raw: &str) -> Result<String, ScrapeError> {
    let invalid = || ScrapeError::InvalidUrl(format!("'{}' is not a LinkedIn profile URL", raw));
    if !raw.contains("linkedin.com/in/") {
        return Err(invalid());
    }
    let mut url = Url::parse(raw.trim()).map_err(|_| invalid())?;
    url.set_query(None);
    url.set_fragment(None);
    Ok(url.to_string())
}

/// Search result links carry tracking parameters; keep scheme, host and path.
fn strip_tracking(href: &str) -> String {
    match Url::parse(href) {
        Ok(mut url) => {
            url.set_query(None);
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => href.to_string(),
    }
}

struct PostCollector;

#[async_trait]
impl Collector for PostCollector {
    type Item = LinkedInPost;

    async fn extract(&self, page: &dyn PageHandle) -> Result<Vec<LinkedInPost>, ScrapeError> {
        let raws: Vec<RawPost> = scripts::POSTS.call(page, json!({})).await?;
        Ok(raws
            .into_iter()
            .filter(|p| !p.text.trim().is_empty())
            .enumerate()
            .map(|(index, p)| LinkedInPost {
                id: p.urn.unwrap_or_else(|| format!("post-{}", index)),
                author: PostAuthor {
                    name: p.author_name,
                    headline: p.author_headline,
                    profile_url: p.author_url.as_deref().map(strip_tracking),
                    profile_image_url: p.author_image,
                },
                text: clean_text(&p.text),
                images: p.images,
                reactions: parse_follower_count(&p.reactions),
                comments: parse_follower_count(&p.comments),
                reposts: parse_follower_count(&p.reposts),
                posted: p.posted,
            })
            .collect())
    }

    fn dedup_key(&self, post: &LinkedInPost) -> String {
        text_key(&post.text, 100)
    }
}

struct SearchCollector {
    kind: SearchKind,
}

impl SearchCollector {
    fn into_hit(&self, raw: RawHit) -> Option<SearchHit> {
        match self.kind {
            SearchKind::People => Some(SearchHit::Person(PersonHit {
                connection_degree: parse_connection_degree(raw.badge.as_deref().unwrap_or_default()),
                name: raw.title,
                headline: raw.primary,
                location: raw.secondary,
                profile_url: strip_tracking(&raw.href?),
            })),
            SearchKind::Companies => Some(SearchHit::Company(CompanyHit {
                follower_count: raw.secondary.as_deref().map(parse_follower_count).unwrap_or(0),
                name: raw.title,
                industry: raw.primary,
                followers: raw.secondary,
                url: strip_tracking(&raw.href?),
            })),
            SearchKind::Posts => {
                let text = raw.text.map(|t| clean_text(&t)).unwrap_or_default();
                if text.is_empty() {
                    return None;
                }
                Some(SearchHit::Post(PostHit {
                    author: raw.title,
                    text: truncate_text(&text, POST_HIT_TEXT_CHARS),
                    url: raw.href.as_deref().map(strip_tracking),
                }))
            }
        }
    }
}

#[async_trait]
impl Collector for SearchCollector {
    type Item = SearchHit;

    async fn extract(&self, page: &dyn PageHandle) -> Result<Vec<SearchHit>, ScrapeError> {
        let raws: Vec<RawHit> = scripts::SEARCH
            .call(page, json!({ "kind": self.kind }))
            .await?;
        Ok(raws.into_iter().filter_map(|raw| self.into_hit(raw)).collect())
    }

    fn dedup_key(&self, hit: &SearchHit) -> String {
        match hit {
            SearchHit::Person(p) => p.profile_url.clone(),
            SearchHit::Company(c) => c.url.clone(),
            SearchHit::Post(p) => p.url.clone().unwrap_or_else(|| text_key(&p.text, 100)),
        }
    }

    /// Prefer the paginator; fall back to scrolling when there is none.
    async fn advance(
        &self,
        page: &dyn PageHandle,
        policy: &ScrollPolicy,
    ) -> Result<Option<bool>, ScrapeError> {
        let clicked: bool = scripts::NEXT_PAGE.call(page, json!({})).await?;
        if !clicked {
            return Ok(None);
        }
        debug!("Advanced to the next LinkedIn results page");
        tokio::time::sleep(policy.settle_delay).await;
        Ok(Some(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_url_of() {
        assert_eq!(
            profile_url_of("https://www.linkedin.com/in/jane-doe/?trk=feed#about").unwrap(),
            "https://www.linkedin.com/in/jane-doe/"
        );
        assert!(profile_url_of("https://www.linkedin.com/company/acme/").is_err());
        assert!(profile_url_of("linkedin.com/in/jane").is_err());
    }

    #[test]
    fn test_search_kind() {
        assert_eq!("people".parse::<SearchKind>().unwrap(), SearchKind::People);
        assert_eq!("Posts".parse::<SearchKind>().unwrap().path(), "content");
        assert!("jobs".parse::<SearchKind>().is_err());
        assert_eq!(serde_json::to_value(SearchKind::Companies).unwrap(), "companies");
    }

    #[test]
    fn test_person_hit() {
        let collector = SearchCollector {
            kind: SearchKind::People,
        };
        let hit = collector
            .into_hit(RawHit {
                title: "Jane Doe".into(),
                primary: Some("Engineer at Acme".into()),
                secondary: Some("Berlin".into()),
                href: Some("https://www.linkedin.com/in/jane?miniProfileUrn=x".into()),
                badge: Some("• 2nd".into()),
                text: None,
            })
            .unwrap();
        let SearchHit::Person(person) = &hit else {
            panic!("expected a person");
        };
        assert_eq!(person.connection_degree, "2nd");
        assert_eq!(person.profile_url, "https://www.linkedin.com/in/jane");
        assert_eq!(collector.dedup_key(&hit), "https://www.linkedin.com/in/jane");
    }

    #[test]
    fn test_hit_without_link_is_dropped() {
        let collector = SearchCollector {
            kind: SearchKind::Companies,
        };
        assert!(collector.into_hit(RawHit::default()).is_none());
    }

    #[test]
    fn test_post_hit_is_truncated() {
        let collector = SearchCollector {
            kind: SearchKind::Posts,
        };
        let hit = collector
            .into_hit(RawHit {
                title: "Jane".into(),
                text: Some("word ".repeat(100)),
                ..Default::default()
            })
            .unwrap();
        let SearchHit::Post(post) = hit else {
            panic!("expected a post");
        };
        assert_eq!(post.text.chars().count(), 200);
        assert!(post.text.ends_with("..."));
    }
}
