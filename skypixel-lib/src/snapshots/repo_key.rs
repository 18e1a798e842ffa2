use crate::Result;
use core::fmt::{Display, Formatter};
use core::str::FromStr;
use ohno::{AppError, bail};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

/// Identifies one repository as `owner/name`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoKey {
    owner: Arc<str>,
    name: Arc<str>,
}

impl RepoKey {
    #[must_use]
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            owner: Arc::from(owner),
            name: Arc::from(name),
        }
    }

    /// Extract the key from a repository URL such as `https://host/owner/name/tree/main`.
    pub fn from_url(url: &Url) -> Result<Self> {
        let path_segments: Vec<_> = url.path_segments().map(Iterator::collect).unwrap_or_default();
        if path_segments.len() < 2 || path_segments[0].is_empty() || path_segments[1].is_empty() {
            bail!("invalid repository URL: {url}");
        }

        Ok(Self::new(path_segments[0], path_segments[1].trim_end_matches(".git")))
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl FromStr for RepoKey {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        let Some((owner, name)) = s.trim().split_once('/') else {
            bail!("invalid repository key '{s}': expected 'owner/name'");
        };

        let valid = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid(owner) || !valid(name) {
            bail!("invalid repository key '{s}': expected 'owner/name'");
        }

        Ok(Self::new(owner, name))
    }
}

impl TryFrom<String> for RepoKey {
    type Error = AppError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<RepoKey> for String {
    fn from(key: RepoKey) -> Self {
        key.to_string()
    }
}

impl Display for RepoKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}
