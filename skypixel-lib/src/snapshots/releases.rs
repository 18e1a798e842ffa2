use super::RepoKey;
use super::cache_entry::{CacheEntry, EntryState, SnapshotSource};
use super::normalize::ApiRelease;
use super::upstream::{UpstreamClient, UpstreamError};
use core::time::Duration;
use futures_util::future::join_all;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

const LOG_TARGET: &str = "  releases";

/// Latest version per tracked repository; `None` when there is no release to show.
pub type ReleaseTable = BTreeMap<RepoKey, Option<String>>;

/// Looks up the latest release of one repository.
///
/// A missing release and a refused lookup (permission or quota) are both definitive
/// answers: they resolve to `None` and are cached like any other value.
#[derive(Debug)]
pub struct ReleaseSource {
    client: Arc<UpstreamClient>,
    key: RepoKey,
    name: String,
}

impl ReleaseSource {
    #[must_use]
    pub fn new(client: Arc<UpstreamClient>, key: RepoKey) -> Self {
        Self {
            name: format!("release of {key}"),
            client,
            key,
        }
    }

    #[must_use]
    pub const fn key(&self) -> &RepoKey {
        &self.key
    }
}

impl SnapshotSource for ReleaseSource {
    type Snapshot = Option<String>;

    fn name(&self) -> &str {
        &self.name
    }

    async fn load(&self) -> Result<Option<String>, UpstreamError> {
        let path = format!("/repos/{}/{}/releases/latest", self.key.owner(), self.key.name());

        match self.client.fetch_json::<ApiRelease>(&path).await {
            Ok(release) => {
                let version = release.latest_version();
                log::debug!(target: LOG_TARGET, "Latest release of '{}' is {version:?}", self.key);
                Ok(version)
            }

            Err(e) if e.is_not_found() => {
                log::debug!(target: LOG_TARGET, "'{}' has no published release", self.key);
                Ok(None)
            }

            Err(e) if e.is_forbidden() => {
                log::debug!(target: LOG_TARGET, "Release lookup for '{}' was refused: {e}", self.key);
                Ok(None)
            }

            Err(e) => Err(e),
        }
    }

    fn empty(&self) -> Option<String> {
        None
    }
}

/// One release cache entry per repository.
///
/// Entries for the tracked repositories exist from the start; lookups of any other
/// repository create their entry on first use.
#[derive(Debug)]
pub struct ReleaseTracker {
    client: Arc<UpstreamClient>,
    tracked: Vec<RepoKey>,
    ttl: Duration,
    log_failures: bool,
    entries: Mutex<HashMap<RepoKey, CacheEntry<ReleaseSource>>>,
}

impl ReleaseTracker {
    #[must_use]
    pub fn new(client: Arc<UpstreamClient>, tracked: Vec<RepoKey>, ttl: Duration, log_failures: bool) -> Self {
        let entries = tracked
            .iter()
            .map(|key| {
                let entry = CacheEntry::new(ReleaseSource::new(Arc::clone(&client), key.clone()), ttl, log_failures);
                (key.clone(), entry)
            })
            .collect();

        Self {
            client,
            tracked,
            ttl,
            log_failures,
            entries: Mutex::new(entries),
        }
    }

    #[must_use]
    pub fn tracked(&self) -> &[RepoKey] {
        &self.tracked
    }

    /// The cache entry for `key`, created on first use.
    #[must_use]
    pub fn entry(&self, key: &RepoKey) -> CacheEntry<ReleaseSource> {
        let mut entries = self.entries.lock().expect("lock not poisoned");
        entries
            .entry(key.clone())
            .or_insert_with(|| CacheEntry::new(ReleaseSource::new(Arc::clone(&self.client), key.clone()), self.ttl, self.log_failures))
            .clone()
    }

    pub async fn latest_release(&self, key: &RepoKey, force: bool) -> Option<String> {
        let entry = self.entry(key);
        (*entry.get(force).await).clone()
    }

    /// Latest versions of every tracked repository, looked up concurrently.
    pub async fn all(&self, force: bool) -> ReleaseTable {
        let versions = join_all(self.tracked.iter().map(|key| self.latest_release(key, force))).await;
        self.tracked.iter().cloned().zip(versions).collect()
    }

    #[must_use]
    pub fn states(&self) -> BTreeMap<RepoKey, EntryState> {
        let entries = self.entries.lock().expect("lock not poisoned");
        entries.iter().map(|(key, entry)| (key.clone(), entry.state())).collect()
    }

    /// Schedule a periodic forced refresh of each tracked repository.
    pub fn schedule_background_refresh(&self, interval: Duration) -> Vec<JoinHandle<()>> {
        self.tracked
            .iter()
            .filter_map(|key| self.entry(key).schedule_background_refresh(interval))
            .collect()
    }
}
