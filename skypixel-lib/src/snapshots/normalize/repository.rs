use crate::snapshots::RepoKey;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Shown when a repository has no description.
pub const NO_DESCRIPTION: &str = "No description provided.";

/// Shown when the upstream does not report a primary language.
pub const UNKNOWN_LANGUAGE: &str = "Unknown";

const PREVIEW_IMAGE_BASE: &str = "https://opengraph.githubassets.com/1";

/// Last-resort artwork, picked by position so that a listing renders the same way every time.
const FALLBACK_IMAGES: &[&str] = &[
    "/images/projects/placeholder-aurora.svg",
    "/images/projects/placeholder-circuit.svg",
    "/images/projects/placeholder-horizon.svg",
    "/images/projects/placeholder-pixels.svg",
];

/// A repository as reported by the REST API, or reconstructed from a scraped listing page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiRepository {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub full_name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub html_url: String,
    pub homepage: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub disabled: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Canonical repository record served to the pages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRecord {
    pub id: u64,
    pub name: String,
    pub full_name: String,
    pub description: String,
    pub html_url: String,
    pub homepage: Option<String>,
    pub language: String,
    pub stars: u64,
    pub forks: u64,
    pub updated_at: Option<DateTime<Utc>>,
    pub pushed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub archived: bool,
    pub disabled: bool,
    pub fork: bool,
    pub topics: Vec<String>,
    pub image_url: String,
}

impl RepositoryRecord {
    fn from_api(repo: ApiRepository, position: usize) -> Self {
        let image_url = resolve_image_url(None, &repo.full_name, position);

        Self {
            id: repo.id,
            name: repo.name,
            full_name: repo.full_name,
            description: non_blank(repo.description).unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            html_url: repo.html_url,
            homepage: non_blank(repo.homepage),
            language: non_blank(repo.language).unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string()),
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            updated_at: repo.updated_at,
            pushed_at: repo.pushed_at,
            created_at: repo.created_at,
            archived: repo.archived,
            disabled: repo.disabled,
            fork: repo.fork,
            topics: dedupe_topics(repo.topics),
            image_url,
        }
    }

    /// Most recent sign of life: last push, else last update, else creation.
    #[must_use]
    pub fn last_activity(&self) -> Option<DateTime<Utc>> {
        self.pushed_at.or(self.updated_at).or(self.created_at)
    }

    #[must_use]
    pub fn key(&self) -> Option<RepoKey> {
        self.full_name.parse().ok()
    }
}

/// Normalize a raw listing: forks are dropped and ids stay unique (first occurrence wins).
///
/// `image_url` is set to the constructed preview image; callers that look up
/// social preview images overwrite it with [`resolve_image_url`].
#[must_use]
pub fn normalize_repositories(repos: Vec<ApiRepository>) -> Vec<RepositoryRecord> {
    let mut seen = HashSet::new();

    repos
        .into_iter()
        .filter(|repo| !repo.fork)
        .filter(|repo| seen.insert(repo.id))
        .enumerate()
        .map(|(position, repo)| RepositoryRecord::from_api(repo, position))
        .collect()
}

/// Pick the card image: the repository's social preview, else the constructed preview
/// image URL, else a fixed placeholder chosen by `position`.
#[must_use]
pub fn resolve_image_url(social_preview: Option<&str>, full_name: &str, position: usize) -> String {
    if let Some(url) = social_preview.map(str::trim).filter(|url| !url.is_empty()) {
        return url.to_string();
    }

    if !full_name.is_empty() {
        return format!("{PREVIEW_IMAGE_BASE}/{full_name}");
    }

    FALLBACK_IMAGES[position % FALLBACK_IMAGES.len()].to_string()
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn dedupe_topics(topics: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    topics
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty() && seen.insert(t.clone()))
        .collect()
}
