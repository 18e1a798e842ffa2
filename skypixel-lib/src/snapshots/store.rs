use super::RepoKey;
use super::cache_entry::{CacheEntry, EntryState};
use super::categorize::Thresholds;
use super::projects::{ProjectCatalog, ProjectsSource};
use super::releases::{ReleaseTable, ReleaseTracker};
use super::team::{TeamRoster, TeamSource};
use super::upstream::{DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_REQUEST_TIMEOUT, Endpoints, UpstreamClient};
use crate::Result;
use core::sync::atomic::{AtomicBool, Ordering};
use core::time::Duration;
use std::sync::Arc;
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "     store";

/// Default contributors page, relative to a repository page.
pub const DEFAULT_CONTRIBUTORS_PATH: &str = "/graphs/contributors";

/// How long one resource stays fresh, and how often it is refreshed in the background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourcePolicy {
    pub ttl: Duration,

    /// Zero disables background refresh.
    pub refresh_interval: Duration,
}

impl ResourcePolicy {
    #[must_use]
    pub const fn new(ttl: Duration, refresh_interval: Duration) -> Self {
        Self { ttl, refresh_interval }
    }
}

/// Everything needed to build a [`CacheStore`].
#[derive(Debug, Clone)]
pub struct StoreSettings {
    pub endpoints: Endpoints,
    pub token: Option<String>,
    pub request_timeout: Duration,
    pub max_concurrent_requests: usize,

    /// Account whose repositories are listed.
    pub owner: String,

    /// Login shown as the creator on the team page.
    pub creator: String,

    pub tracked_releases: Vec<RepoKey>,
    pub team_repositories: Vec<RepoKey>,
    pub contributors_path: String,
    pub social_previews: bool,
    pub thresholds: Thresholds,
    pub releases: ResourcePolicy,
    pub projects: ResourcePolicy,
    pub team: ResourcePolicy,

    /// In production, refresh failures are not logged.
    pub production: bool,
}

impl StoreSettings {
    /// Settings with the stock TTLs and thresholds, background refresh disabled.
    #[must_use]
    pub fn new(owner: impl Into<String>, creator: impl Into<String>) -> Self {
        Self {
            endpoints: Endpoints::default(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            max_concurrent_requests: DEFAULT_MAX_CONCURRENT_REQUESTS,
            owner: owner.into(),
            creator: creator.into(),
            tracked_releases: Vec::new(),
            team_repositories: Vec::new(),
            contributors_path: DEFAULT_CONTRIBUTORS_PATH.to_string(),
            social_previews: true,
            thresholds: Thresholds::default(),
            releases: ResourcePolicy::new(Duration::from_secs(10 * 60), Duration::ZERO),
            projects: ResourcePolicy::new(Duration::from_secs(15 * 60), Duration::ZERO),
            team: ResourcePolicy::new(Duration::from_secs(60 * 60), Duration::ZERO),
            production: false,
        }
    }
}

/// The cached snapshots route handlers read from.
///
/// Built once at startup and shared; every accessor always returns a value and never
/// an upstream error.
#[derive(Debug)]
pub struct CacheStore {
    projects: CacheEntry<ProjectsSource>,
    team: CacheEntry<TeamSource>,
    releases: ReleaseTracker,
    policies: [ResourcePolicy; 3],
    started: AtomicBool,
}

impl CacheStore {
    /// Build the store and its upstream client.
    ///
    /// Fails only when the HTTP client cannot be created.
    pub fn new(settings: StoreSettings) -> Result<Self> {
        let client = Arc::new(UpstreamClient::new(
            settings.token.as_deref(),
            settings.endpoints,
            settings.request_timeout,
            settings.max_concurrent_requests,
        )?);
        let log_failures = !settings.production;

        let projects = CacheEntry::new(
            ProjectsSource::new(Arc::clone(&client), settings.owner, settings.thresholds, settings.social_previews),
            settings.projects.ttl,
            log_failures,
        );

        let team = CacheEntry::new(
            TeamSource::new(Arc::clone(&client), settings.creator, settings.team_repositories, settings.contributors_path),
            settings.team.ttl,
            log_failures,
        );

        let releases = ReleaseTracker::new(client, settings.tracked_releases, settings.releases.ttl, log_failures);

        Ok(Self {
            projects,
            team,
            releases,
            policies: [settings.projects, settings.team, settings.releases],
            started: AtomicBool::new(false),
        })
    }

    pub async fn projects(&self, force: bool) -> Arc<ProjectCatalog> {
        self.projects.get(force).await
    }

    pub async fn team(&self, force: bool) -> Arc<TeamRoster> {
        self.team.get(force).await
    }

    /// Latest versions of all tracked repositories.
    pub async fn releases(&self, force: bool) -> ReleaseTable {
        self.releases.all(force).await
    }

    /// Latest version of any repository, tracked or not.
    pub async fn latest_release(&self, key: &RepoKey, force: bool) -> Option<String> {
        self.releases.latest_release(key, force).await
    }

    /// Force one refresh of every resource, concurrently. Failures leave the previous data in place.
    pub async fn warm_up(&self) {
        log::info!(target: LOG_TARGET, "Warming up the snapshot caches");
        let (projects, team, releases) = tokio::join!(self.projects(true), self.team(true), self.releases(true));
        log::info!(
            target: LOG_TARGET,
            "Caches warm: {} repositories, {} team members, {} of {} releases known",
            projects.repositories.len(),
            team.members.len(),
            releases.values().filter(|v| v.is_some()).count(),
            releases.len()
        );
    }

    /// Warm up the caches and schedule background refreshes.
    ///
    /// Only the first call does anything; later calls return no handles. The refresh tasks
    /// stop once the store is dropped.
    pub async fn start(&self) -> Vec<JoinHandle<()>> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Vec::new();
        }

        self.warm_up().await;

        let [projects, team, releases] = self.policies;
        let mut handles: Vec<_> = self.projects.schedule_background_refresh(projects.refresh_interval).into_iter().collect();
        handles.extend(self.team.schedule_background_refresh(team.refresh_interval));
        handles.extend(self.releases.schedule_background_refresh(releases.refresh_interval));

        log::debug!(target: LOG_TARGET, "Scheduled {} background refresh tasks", handles.len());
        handles
    }

    /// The lifecycle state of every entry, for status output.
    #[must_use]
    pub fn states(&self) -> Vec<(String, EntryState)> {
        let mut states = vec![
            (self.projects.name().to_string(), self.projects.state()),
            (self.team.name().to_string(), self.team.state()),
        ];
        states.extend(self.releases.states().into_iter().map(|(key, state)| (format!("release of {key}"), state)));
        states
    }
}
