//! Sorting of repositories and people into the sections the pages display.

use super::normalize::{RepositoryRecord, Role};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const DEFAULT_EOL_DAYS: u32 = 180;
pub const DEFAULT_NEW_DAYS: u32 = 30;
pub const DEFAULT_POPULAR_COUNT: usize = 2;
pub const DEFAULT_NEW_RELEASE_COUNT: usize = 4;

/// Cut-offs used to place repositories into sections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
    /// Repositories idle for longer than this are end-of-life.
    pub eol_days: u32,

    /// Repositories active within this window are new releases.
    pub new_days: u32,

    pub popular_count: usize,
    pub new_release_count: usize,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            eol_days: DEFAULT_EOL_DAYS,
            new_days: DEFAULT_NEW_DAYS,
            popular_count: DEFAULT_POPULAR_COUNT,
            new_release_count: DEFAULT_NEW_RELEASE_COUNT,
        }
    }
}

/// Disjoint sections of the projects page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoCategories {
    pub popular: Vec<RepositoryRecord>,
    pub new_releases: Vec<RepositoryRecord>,
    pub archived: Vec<RepositoryRecord>,
}

impl RepoCategories {
    /// Place each repository into at most one section.
    ///
    /// End-of-life repositories (archived upstream, or idle for more than `eol_days`) go to
    /// `archived`, most recently active first. The remaining ones are ranked by stars, ties
    /// broken by more recent activity, and the top `popular_count` become `popular`. Of the
    /// rest, those active within `new_days` become `new_releases`, most recent first, capped
    /// at `new_release_count`. A repository without any timestamp is neither end-of-life nor new.
    #[must_use]
    pub fn from_repositories(repos: &[RepositoryRecord], thresholds: &Thresholds, now: DateTime<Utc>) -> Self {
        let eol_cutoff = now - Duration::days(i64::from(thresholds.eol_days));
        let new_cutoff = now - Duration::days(i64::from(thresholds.new_days));

        let (mut archived, mut active): (Vec<_>, Vec<_>) = repos.iter().partition(|repo| is_end_of_life(repo, eol_cutoff));

        archived.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));

        active.sort_by(|a, b| b.stars.cmp(&a.stars).then_with(|| b.last_activity().cmp(&a.last_activity())));
        let remaining = active.split_off(thresholds.popular_count.min(active.len()));
        let popular = active;

        let mut new_releases: Vec<_> = remaining
            .into_iter()
            .filter(|repo| repo.last_activity().is_some_and(|at| at >= new_cutoff))
            .collect();
        new_releases.sort_by(|a, b| b.last_activity().cmp(&a.last_activity()));
        new_releases.truncate(thresholds.new_release_count);

        Self {
            popular: popular.into_iter().cloned().collect(),
            new_releases: new_releases.into_iter().cloned().collect(),
            archived: archived.into_iter().cloned().collect(),
        }
    }
}

fn is_end_of_life(repo: &RepositoryRecord, cutoff: DateTime<Utc>) -> bool {
    repo.archived || repo.last_activity().is_some_and(|at| at < cutoff)
}

/// Give every login its role: `creator` first as [`Role::Creator`], added even when it is
/// not among `logins`, then everyone else alphabetically as [`Role::Contributor`].
#[must_use]
pub fn assign_roles(logins: &BTreeSet<String>, creator: &str) -> Vec<(String, Role)> {
    let creator_lower = creator.to_ascii_lowercase();

    core::iter::once((creator.to_string(), Role::Creator))
        .chain(
            logins
                .iter()
                .filter(|login| login.to_ascii_lowercase() != creator_lower)
                .map(|login| (login.clone(), Role::Contributor)),
        )
        .collect()
}
