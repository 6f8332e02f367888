use serde::{Deserialize, Serialize};

use super::parse::DurationRange;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInProfile {
    pub url: String,
    pub name: String,
    pub headline: String,
    pub location: Option<String>,
    pub about: Option<String>,
    pub profile_image_url: Option<String>,
    /// As displayed, e.g. `"500+"`.
    pub connections: Option<String>,
    pub experience: Vec<Experience>,
    pub education: Vec<Education>,
    pub skills: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub company_url: Option<String>,
    pub duration: String,
    pub period: DurationRange,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Education {
    pub school: String,
    pub degree: Option<String>,
    pub dates: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostAuthor {
    pub name: String,
    pub headline: Option<String>,
    pub profile_url: Option<String>,
    pub profile_image_url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInPost {
    pub id: String,
    pub author: PostAuthor,
    pub text: String,
    pub images: Vec<String>,
    pub reactions: u64,
    pub comments: u64,
    pub reposts: u64,
    /// Relative age as displayed, e.g. `"2d"`.
    pub posted: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInPosts {
    pub profile_url: String,
    pub posts: Vec<LinkedInPost>,
    pub has_more: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchKind {
    People,
    Companies,
    Posts,
}

impl SearchKind {
    /// Path segment under `/search/results/`.
    pub fn path(&self) -> &'static str {
        match self {
            SearchKind::People => "people",
            SearchKind::Companies => "companies",
            SearchKind::Posts => "content",
        }
    }
}

impl std::str::FromStr for SearchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "people" => Ok(SearchKind::People),
            "companies" => Ok(SearchKind::Companies),
            "posts" | "content" => Ok(SearchKind::Posts),
            other => Err(format!(
                "unknown search type '{}', expected people, companies or posts",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonHit {
    pub name: String,
    pub headline: Option<String>,
    pub location: Option<String>,
    pub profile_url: String,
    pub connection_degree: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompanyHit {
    pub name: String,
    pub industry: Option<String>,
    pub followers: Option<String>,
    pub follower_count: u64,
    pub url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostHit {
    pub author: String,
    pub text: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SearchHit {
    Person(PersonHit),
    Company(CompanyHit),
    Post(PostHit),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedInSearchResults {
    pub query: String,
    pub kind: SearchKind,
    pub results: Vec<SearchHit>,
    pub has_more: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawExperience {
    pub title: String,
    pub company: String,
    pub company_url: Option<String>,
    pub duration: String,
    pub description: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawEducation {
    pub school: String,
    pub degree: Option<String>,
    pub dates: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawProfile {
    pub name: String,
    pub headline: String,
    pub location: Option<String>,
    pub about: Option<String>,
    pub profile_image_url: Option<String>,
    pub connections: Option<String>,
    pub experience: Vec<RawExperience>,
    pub education: Vec<RawEducation>,
    pub skills: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawPost {
    pub urn: Option<String>,
    pub author_name: String,
    pub author_headline: Option<String>,
    pub author_url: Option<String>,
    pub author_image: Option<String>,
    pub text: String,
    pub images: Vec<String>,
    pub reactions: String,
    pub comments: String,
    pub reposts: String,
    pub posted: Option<String>,
}

/// One search result card; the meaning of each field depends on the kind.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub(super) struct RawHit {
    pub title: String,
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub href: Option<String>,
    pub badge: Option<String>,
    pub text: Option<String>,
}
