use core::fmt::{Display, Formatter};
use serde::{Deserialize, Serialize};

const AVATAR_BASE: &str = "https://github.com";

/// Position of a person on the team page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// The one configured identity that founded the studio.
    Creator,
    Contributor,
}

impl Role {
    /// Bio shown when a member has not written one.
    #[must_use]
    pub const fn default_description(self) -> &'static str {
        match self {
            Self::Creator => "Founder of Skypixel, designing and building every project from the first pixel.",
            Self::Contributor => "Open-source contributor helping Skypixel projects grow.",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Creator => write!(f, "Creator"),
            Self::Contributor => write!(f, "Contributor"),
        }
    }
}

/// Display name and bio scraped from a profile page. Empty strings when absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileDetails {
    pub name: String,
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamMember {
    pub login: String,
    pub name: String,
    pub avatar_url: String,
    pub profile_url: String,
    pub role: Role,
    pub description: String,
}

impl TeamMember {
    /// Build a member, filling gaps in `profile` with the login and the role's default bio.
    #[must_use]
    pub fn new(login: &str, role: Role, profile: Option<ProfileDetails>, web_base_url: &str) -> Self {
        let profile = profile.unwrap_or_default();
        let name = match profile.name.trim() {
            "" => login.to_string(),
            name => name.to_string(),
        };
        let description = match profile.bio.trim() {
            "" => role.default_description().to_string(),
            bio => bio.to_string(),
        };

        Self {
            login: login.to_string(),
            name,
            avatar_url: format!("{AVATAR_BASE}/{login}.png"),
            profile_url: format!("{}/{login}", web_base_url.trim_end_matches('/')),
            role,
            description,
        }
    }
}
