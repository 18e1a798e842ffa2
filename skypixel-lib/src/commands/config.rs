use crate::Result;
use crate::snapshots::upstream::{DEFAULT_MAX_CONCURRENT_REQUESTS, DEFAULT_REQUEST_TIMEOUT, Endpoints};
use crate::snapshots::{RepoKey, ResourcePolicy, StoreSettings, Thresholds, categorize};
use camino::Utf8Path;
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use url::Url;

const LOG_TARGET: &str = "    config";

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Configuration file looked up in the current directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "skypixel.toml";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Account whose repositories are listed
    pub owner: String,

    /// Login shown as the creator on the team page
    pub creator: String,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_web_base_url")]
    pub web_base_url: String,

    /// Deadline for each upstream request
    #[serde(default = "default_request_timeout", with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Upper bound on concurrent upstream requests
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    #[serde(default = "default_releases_ttl", with = "humantime_serde")]
    pub releases_ttl: Duration,

    #[serde(default = "default_projects_ttl", with = "humantime_serde")]
    pub projects_ttl: Duration,

    #[serde(default = "default_team_ttl", with = "humantime_serde")]
    pub team_ttl: Duration,

    /// Zero disables background refresh of releases
    #[serde(default = "default_releases_ttl", with = "humantime_serde")]
    pub releases_refresh_interval: Duration,

    /// Zero disables background refresh of the project list
    #[serde(default = "default_projects_ttl", with = "humantime_serde")]
    pub projects_refresh_interval: Duration,

    /// Zero disables background refresh of the team
    #[serde(default = "default_team_ttl", with = "humantime_serde")]
    pub team_refresh_interval: Duration,

    /// Days of inactivity after which a repository is end-of-life
    #[serde(default = "default_eol_days")]
    pub eol_days: u32,

    /// Days of activity within which a repository is a new release
    #[serde(default = "default_new_days")]
    pub new_days: u32,

    #[serde(default = "default_popular_count")]
    pub popular_count: usize,

    #[serde(default = "default_new_release_count")]
    pub new_release_count: usize,

    /// Repositories whose latest release is shown
    #[serde(default)]
    pub tracked_releases: Vec<RepoKey>,

    /// Repositories whose contributors make up the team
    #[serde(default)]
    pub team_repositories: Vec<RepoKey>,

    /// Contributors page, relative to a repository page
    #[serde(default = "default_contributors_path")]
    pub contributors_path: String,

    /// Look up social preview images for repository cards
    #[serde(default = "default_social_previews")]
    pub social_previews: bool,
}

fn default_api_base_url() -> String {
    crate::snapshots::upstream::DEFAULT_API_BASE_URL.to_string()
}

fn default_web_base_url() -> String {
    crate::snapshots::upstream::DEFAULT_WEB_BASE_URL.to_string()
}

const fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

const fn default_max_concurrent_requests() -> usize {
    DEFAULT_MAX_CONCURRENT_REQUESTS
}

const fn default_releases_ttl() -> Duration {
    Duration::from_mins(10)
}

const fn default_projects_ttl() -> Duration {
    Duration::from_mins(15)
}

const fn default_team_ttl() -> Duration {
    Duration::from_hours(1)
}

const fn default_eol_days() -> u32 {
    categorize::DEFAULT_EOL_DAYS
}

const fn default_new_days() -> u32 {
    categorize::DEFAULT_NEW_DAYS
}

const fn default_popular_count() -> usize {
    categorize::DEFAULT_POPULAR_COUNT
}

const fn default_new_release_count() -> usize {
    categorize::DEFAULT_NEW_RELEASE_COUNT
}

fn default_contributors_path() -> String {
    crate::snapshots::DEFAULT_CONTRIBUTORS_PATH.to_string()
}

const fn default_social_previews() -> bool {
    true
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `skypixel.toml` in the current directory is used when it exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds invalid values
    pub fn load(config_path: Option<&Utf8Path>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.to_owned(), text)
        } else {
            let path = Utf8Path::new(DEFAULT_CONFIG_FILE).to_owned();
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!(target: LOG_TARGET, "No '{path}' found, using the default configuration");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns an error if a value is out of range or inconsistent with another
    pub fn validate(&self) -> Result<()> {
        if self.owner.trim().is_empty() {
            return Err(app_err!("owner must not be empty"));
        }

        if self.creator.trim().is_empty() {
            return Err(app_err!("creator must not be empty"));
        }

        for (name, value) in [("api_base_url", &self.api_base_url), ("web_base_url", &self.web_base_url)] {
            let url = Url::parse(value).into_app_err_with(|| format!("{name} must be an absolute URL, got '{value}'"))?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(app_err!("{name} must be an http or https URL, got '{value}'"));
            }
        }

        if self.request_timeout.is_zero() {
            return Err(app_err!("request_timeout must be greater than zero"));
        }

        if self.max_concurrent_requests == 0 {
            return Err(app_err!("max_concurrent_requests must be at least 1"));
        }

        for (name, ttl) in [
            ("releases_ttl", self.releases_ttl),
            ("projects_ttl", self.projects_ttl),
            ("team_ttl", self.team_ttl),
        ] {
            if ttl.is_zero() {
                return Err(app_err!("{name} must be greater than zero"));
            }
        }

        if self.eol_days == 0 || self.new_days == 0 {
            return Err(app_err!(
                "eol_days and new_days must be greater than zero, got {} and {}",
                self.eol_days,
                self.new_days
            ));
        }

        if self.new_days >= self.eol_days {
            return Err(app_err!(
                "new_days ({}) must be less than eol_days ({})",
                self.new_days,
                self.eol_days
            ));
        }

        if self.popular_count == 0 || self.new_release_count == 0 {
            return Err(app_err!("popular_count and new_release_count must be at least 1"));
        }

        if !self.contributors_path.starts_with('/') {
            return Err(app_err!("contributors_path must start with '/', got '{}'", self.contributors_path));
        }

        Ok(())
    }

    /// Settings for building the snapshot store from this configuration
    #[must_use]
    pub fn store_settings(&self, token: Option<String>, production: bool) -> StoreSettings {
        StoreSettings {
            endpoints: Endpoints::new(self.api_base_url.as_str(), self.web_base_url.as_str()),
            token,
            request_timeout: self.request_timeout,
            max_concurrent_requests: self.max_concurrent_requests,
            owner: self.owner.clone(),
            creator: self.creator.clone(),
            tracked_releases: self.tracked_releases.clone(),
            team_repositories: self.team_repositories.clone(),
            contributors_path: self.contributors_path.clone(),
            social_previews: self.social_previews,
            thresholds: Thresholds {
                eol_days: self.eol_days,
                new_days: self.new_days,
                popular_count: self.popular_count,
                new_release_count: self.new_release_count,
            },
            releases: ResourcePolicy::new(self.releases_ttl, self.releases_refresh_interval),
            projects: ResourcePolicy::new(self.projects_ttl, self.projects_refresh_interval),
            team: ResourcePolicy::new(self.team_ttl, self.team_refresh_interval),
            production,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        config.validate().unwrap();
    }

    #[test]
    fn test_default_config_values() {
        let config = Config::default();
        assert_eq!(config.request_timeout, Duration::from_secs(7));
        assert_eq!(config.eol_days, 180);
        assert_eq!(config.new_days, 30);
        assert_eq!(config.popular_count, 2);
        assert_eq!(config.new_release_count, 4);
        assert_eq!(config.max_concurrent_requests, 5);
        assert!(config.social_previews);
    }

    #[test]
    fn test_minimal_config_uses_field_defaults() {
        let config: Config = toml::from_str("owner = \"octo\"\ncreator = \"octo\"\n").unwrap();
        config.validate().unwrap();

        assert_eq!(config.releases_ttl, Duration::from_mins(10));
        assert_eq!(config.team_refresh_interval, Duration::from_hours(1));
        assert!(config.tracked_releases.is_empty());
        assert_eq!(config.contributors_path, "/graphs/contributors");
    }

    #[test]
    fn test_validate_empty_owner() {
        let config = Config {
            owner: "  ".into(),
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_relative_url() {
        let config = Config {
            api_base_url: "api.github.com".into(),
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_non_http_url() {
        let config = Config {
            web_base_url: "ftp://github.com".into(),
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_new_days_must_be_below_eol_days() {
        let config = Config {
            new_days: 180,
            eol_days: 180,
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_validate_zero_values() {
        let _ = Config {
            request_timeout: Duration::ZERO,
            ..Config::default()
        }
        .validate()
        .unwrap_err();

        let _ = Config {
            team_ttl: Duration::ZERO,
            ..Config::default()
        }
        .validate()
        .unwrap_err();

        let _ = Config {
            max_concurrent_requests: 0,
            ..Config::default()
        }
        .validate()
        .unwrap_err();

        let _ = Config {
            popular_count: 0,
            ..Config::default()
        }
        .validate()
        .unwrap_err();
    }

    #[test]
    fn test_zero_refresh_interval_is_allowed() {
        let config = Config {
            projects_refresh_interval: Duration::ZERO,
            ..Config::default()
        };
        config.validate().unwrap();
        assert!(config.store_settings(None, true).projects.refresh_interval.is_zero());
    }

    #[test]
    fn test_validate_contributors_path() {
        let config = Config {
            contributors_path: "graphs/contributors".into(),
            ..Config::default()
        };
        let _ = config.validate().unwrap_err();
    }

    #[test]
    fn test_invalid_repo_key_rejected_on_parse() {
        let text = "owner = \"octo\"\ncreator = \"octo\"\ntracked_releases = [\"not-a-key\"]\n";
        let _ = toml::from_str::<Config>(text).unwrap_err();
    }

    #[test]
    fn test_unknown_field_rejected() {
        let text = "owner = \"octo\"\ncreator = \"octo\"\ncolour = \"blue\"\n";
        let _ = toml::from_str::<Config>(text).unwrap_err();
    }

    #[test]
    fn test_store_settings_carries_values() {
        let config = Config::default();
        let settings = config.store_settings(Some("secret".into()), true);

        assert_eq!(settings.owner, config.owner);
        assert_eq!(settings.token.as_deref(), Some("secret"));
        assert!(settings.production);
        assert_eq!(settings.thresholds, Thresholds::default());
        assert_eq!(settings.tracked_releases, config.tracked_releases);
        assert_eq!(settings.endpoints.api_base_url, "https://api.github.com");
        assert_eq!(settings.releases.ttl, Duration::from_mins(10));
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_save_default_and_load() {
        let tmp = tempfile::tempdir().unwrap();
        let output_path = Utf8PathBuf::try_from(tmp.path().join("skypixel.toml")).unwrap();
        Config::save_default(&output_path).unwrap();

        let loaded = Config::load(Some(&output_path)).unwrap();
        assert_eq!(loaded, Config::default());
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_missing_explicit_file_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let missing = Utf8PathBuf::try_from(tmp.path().join("missing.toml")).unwrap();
        let _ = Config::load(Some(&missing)).unwrap_err();
    }

    #[test]
    #[cfg_attr(miri, ignore = "Miri cannot call GetTempPathW")]
    fn test_load_rejects_invalid_values() {
        let tmp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::try_from(tmp.path().join("bad.toml")).unwrap();
        fs::write(&path, "owner = \"octo\"\ncreator = \"octo\"\nnew_days = 400\n").unwrap();

        let _ = Config::load(Some(&path)).unwrap_err();
    }

    #[test]
    fn test_default_config_toml_is_not_empty() {
        assert!(!DEFAULT_CONFIG_TOML.is_empty());
    }
}
