use serde::Deserialize;

/// The subset of a "latest release" payload the site uses.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiRelease {
    pub tag_name: Option<String>,
    pub name: Option<String>,
}

impl ApiRelease {
    /// The version to display: the tag name, else the release title.
    #[must_use]
    pub fn latest_version(self) -> Option<String> {
        let non_blank = |v: Option<String>| v.map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        non_blank(self.tag_name).or_else(|| non_blank(self.name))
    }
}
