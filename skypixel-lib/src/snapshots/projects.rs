use super::cache_entry::SnapshotSource;
use super::categorize::{RepoCategories, Thresholds};
use super::lookup_outcome::LookupOutcome;
use super::normalize::{ApiRepository, RepositoryRecord, normalize_repositories, resolve_image_url, scrape};
use super::upstream::{UpstreamClient, UpstreamError};
use chrono::{DateTime, Utc};
use core::fmt::{Display, Formatter};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const LOG_TARGET: &str = "  projects";

/// Where a catalog's repository list came from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CatalogOrigin {
    /// The REST API.
    Api,

    /// The public repository listing page.
    Html,

    /// Nothing was ever loaded.
    #[default]
    Unavailable,
}

impl Display for CatalogOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Api => write!(f, "the API"),
            Self::Html => write!(f, "the listing page"),
            Self::Unavailable => write!(f, "nowhere"),
        }
    }
}

/// Everything the projects page shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectCatalog {
    pub repositories: Vec<RepositoryRecord>,
    pub categories: RepoCategories,
    pub origin: CatalogOrigin,
    pub generated_at: Option<DateTime<Utc>>,
}

/// Loads the owner's repositories, from the API or else from the listing page.
#[derive(Debug)]
pub struct ProjectsSource {
    client: Arc<UpstreamClient>,
    owner: String,
    thresholds: Thresholds,
    social_previews: bool,
}

impl ProjectsSource {
    #[must_use]
    pub fn new(client: Arc<UpstreamClient>, owner: impl Into<String>, thresholds: Thresholds, social_previews: bool) -> Self {
        Self {
            client,
            owner: owner.into(),
            thresholds,
            social_previews,
        }
    }

    async fn fetch_listing(&self) -> Result<(Vec<ApiRepository>, CatalogOrigin), UpstreamError> {
        let path = format!("/users/{}/repos?per_page=100&sort=updated&type=owner", self.owner);

        match self.client.fetch_json::<Vec<ApiRepository>>(&path).await {
            Ok(repos) => Ok((repos, CatalogOrigin::Api)),
            Err(api_error) => {
                log::info!(target: LOG_TARGET, "Repository API unavailable for '{}' ({api_error}), reading the listing page instead", self.owner);

                let html = self.client.fetch_html(&format!("/{}?tab=repositories", self.owner)).await?;
                let repos = scrape::parse_repository_listing(&html, &self.owner, &self.client.endpoints().web_base_url);

                // a page we cannot read is no better than the API failure
                if repos.is_empty() {
                    return Err(api_error);
                }

                Ok((repos, CatalogOrigin::Html))
            }
        }
    }

    async fn social_preview(&self, full_name: &str) -> LookupOutcome<String> {
        let outcome = LookupOutcome::from_result(self.client.fetch_html(&format!("/{full_name}")).await).map(|html| scrape::parse_social_preview(&html));

        match outcome {
            LookupOutcome::Found(Some(url)) => LookupOutcome::Found(url),
            LookupOutcome::Found(None) | LookupOutcome::Absent => LookupOutcome::Absent,
            LookupOutcome::Failed(e) => {
                log::debug!(target: LOG_TARGET, "Could not look up the preview image of '{full_name}': {e}");
                LookupOutcome::Failed(e)
            }
        }
    }
}

impl SnapshotSource for ProjectsSource {
    type Snapshot = ProjectCatalog;

    fn name(&self) -> &str {
        "projects"
    }

    async fn load(&self) -> Result<ProjectCatalog, UpstreamError> {
        let (listing, origin) = self.fetch_listing().await?;
        let mut repositories = normalize_repositories(listing);

        if self.social_previews {
            let previews = join_all(repositories.iter().map(|repo| self.social_preview(&repo.full_name))).await;

            for (position, (repo, preview)) in repositories.iter_mut().zip(previews).enumerate() {
                if let LookupOutcome::Found(url) = preview {
                    repo.image_url = resolve_image_url(Some(&url), &repo.full_name, position);
                }
            }
        }

        let now = Utc::now();
        let categories = RepoCategories::from_repositories(&repositories, &self.thresholds, now);

        log::info!(
            target: LOG_TARGET,
            "Loaded {} repositories of '{}' from {origin} ({} popular, {} new, {} archived)",
            repositories.len(),
            self.owner,
            categories.popular.len(),
            categories.new_releases.len(),
            categories.archived.len()
        );

        Ok(ProjectCatalog {
            repositories,
            categories,
            origin,
            generated_at: Some(now),
        })
    }

    fn empty(&self) -> ProjectCatalog {
        ProjectCatalog::default()
    }
}
