use super::RepoKey;
use super::cache_entry::SnapshotSource;
use super::categorize::assign_roles;
use super::lookup_outcome::LookupOutcome;
use super::normalize::{ProfileDetails, Role, TeamMember, scrape};
use super::upstream::{UpstreamClient, UpstreamError};
use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

const LOG_TARGET: &str = "      team";

/// Everyone shown on the about page, creator first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamRoster {
    pub members: Vec<TeamMember>,
}

impl TeamRoster {
    #[must_use]
    pub fn creator(&self) -> Option<&TeamMember> {
        self.members.iter().find(|m| m.role == Role::Creator)
    }

    pub fn contributors(&self) -> impl Iterator<Item = &TeamMember> {
        self.members.iter().filter(|m| m.role == Role::Contributor)
    }
}

/// Builds the roster from the contributor pages of the team repositories and the
/// profile page of each person found there.
#[derive(Debug)]
pub struct TeamSource {
    client: Arc<UpstreamClient>,
    creator: String,
    repositories: Vec<RepoKey>,
    contributors_path: String,
}

impl TeamSource {
    #[must_use]
    pub fn new(client: Arc<UpstreamClient>, creator: impl Into<String>, repositories: Vec<RepoKey>, contributors_path: impl Into<String>) -> Self {
        Self {
            client,
            creator: creator.into(),
            repositories,
            contributors_path: contributors_path.into(),
        }
    }

    async fn contributors_of(&self, key: &RepoKey) -> LookupOutcome<BTreeSet<String>> {
        let path = format!("/{}/{}{}", key.owner(), key.name(), self.contributors_path);
        let outcome = LookupOutcome::from_result(self.client.fetch_html(&path).await).map(|html| scrape::parse_contributors(&html));

        if let LookupOutcome::Failed(e) = &outcome {
            log::debug!(target: LOG_TARGET, "Could not read the contributors of '{key}': {e}");
        }

        outcome
    }

    async fn profile(&self, login: &str) -> LookupOutcome<ProfileDetails> {
        let outcome = LookupOutcome::from_result(self.client.fetch_html(&format!("/{login}")).await).map(|html| scrape::parse_profile(&html));

        if let LookupOutcome::Failed(e) = &outcome {
            log::debug!(target: LOG_TARGET, "Could not read the profile of '{login}': {e}");
        }

        outcome
    }
}

impl SnapshotSource for TeamSource {
    type Snapshot = TeamRoster;

    fn name(&self) -> &str {
        "team"
    }

    async fn load(&self) -> Result<TeamRoster, UpstreamError> {
        let pages = join_all(self.repositories.iter().map(|key| self.contributors_of(key))).await;

        let mut logins = BTreeSet::new();
        let mut failures = 0;
        let mut last_error = None;
        for page in pages {
            match page {
                LookupOutcome::Found(found) => logins.extend(found),
                LookupOutcome::Absent => {}
                LookupOutcome::Failed(e) => {
                    failures += 1;
                    last_error = Some(e);
                }
            }
        }

        // nothing was readable, so keep whatever roster we had before
        if let Some(e) = last_error
            && failures == self.repositories.len()
        {
            return Err(e);
        }

        let roles = assign_roles(&logins, &self.creator);
        let profiles = join_all(roles.iter().map(|(login, _)| self.profile(login))).await;

        let web_base_url = &self.client.endpoints().web_base_url;
        let members: Vec<_> = roles
            .into_iter()
            .zip(profiles)
            .map(|((login, role), profile)| TeamMember::new(&login, role, profile.found(), web_base_url))
            .collect();

        log::info!(target: LOG_TARGET, "Loaded a team of {} from {} repositories", members.len(), self.repositories.len());

        Ok(TeamRoster { members })
    }

    fn empty(&self) -> TeamRoster {
        TeamRoster {
            members: vec![TeamMember::new(&self.creator, Role::Creator, None, &self.client.endpoints().web_base_url)],
        }
    }
}
