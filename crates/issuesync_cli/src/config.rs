//! Configuration file support for issuesync.
//!
//! Configuration is loaded with the following precedence (highest to lowest):
//! 1. CLI flags
//! 2. Environment variables (prefixed with `ISSUESYNC_`, sections split by `__`,
//!    e.g. `ISSUESYNC_LINEAR__API_KEY`)
//! 3. Config file (./issuesync.toml, then ~/.config/issuesync/config.toml)
//! 4. Legacy `GITHUB_TOKEN` / `LINEAR_API_KEY` environment variables
//! 5. Built-in defaults
//!
//! Example config file:
//! ```toml
//! [github]
//! token = "ghp_..."  # or use ISSUESYNC_GITHUB__TOKEN / GITHUB_TOKEN
//! owner = "acme"
//! repo = "widgets"
//! rps = 10           # 0 disables proactive pacing
//!
//! [linear]
//! api_key = "lin_api_..."  # or use ISSUESYNC_LINEAR__API_KEY / LINEAR_API_KEY
//! team = "ENG"             # id, key or name
//!
//! [sync]
//! priority_label_prefix = "priority"
//! quota_low_water = 100
//! dry_run = false
//!
//! [overrides]
//! alice = "alice@example.com"
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use directories::ProjectDirs;
use issuesync::RepoCoordinates;
use issuesync::rate_limits;
use issuesync::sync::DEFAULT_QUOTA_LOW_WATER;
use serde::Deserialize;
use thiserror::Error;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// GitHub (source) configuration.
    pub github: GitHubConfig,
    /// Linear (destination) configuration.
    pub linear: LinearConfig,
    /// Default sync options.
    pub sync: SyncConfig,
    /// GitHub login to Linear display name or email.
    pub overrides: HashMap<String, String>,
}

/// GitHub configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GitHubConfig {
    /// GitHub API token.
    pub token: Option<String>,
    /// Repository owner.
    pub owner: Option<String>,
    /// Repository name.
    pub repo: Option<String>,
    /// API base URL, for GitHub Enterprise.
    pub api_url: Option<String>,
    /// Requests per second. Zero disables pacing.
    pub rps: u32,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            owner: None,
            repo: None,
            api_url: None,
            rps: rate_limits::GITHUB_DEFAULT_RPS,
        }
    }
}

/// Linear configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LinearConfig {
    /// Linear personal API key.
    pub api_key: Option<String>,
    /// Team id, key or name.
    pub team: Option<String>,
    /// Requests per second. Zero disables pacing.
    pub rps: u32,
}

impl Default for LinearConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            team: None,
            rps: rate_limits::LINEAR_DEFAULT_RPS,
        }
    }
}

/// Default sync options.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Prefix that marks priority labels (e.g. "priority" for "priority: p1").
    pub priority_label_prefix: Option<String>,
    /// Stop collecting when the GitHub quota drops below this.
    pub quota_low_water: usize,
    /// Plan without applying.
    pub dry_run: bool,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            priority_label_prefix: None,
            quota_low_water: DEFAULT_QUOTA_LOW_WATER,
            dry_run: false,
        }
    }
}

/// Configuration that cannot be used for a run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {}\n\n{}", .0.join(", "), REMEDIATION)]
    Missing(Vec<&'static str>),

    /// A source could not be read or a value has the wrong type.
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Invalid repository '{0}': expected owner/name")]
    InvalidRepo(String),
}

const REMEDIATION: &str = "Set them in ~/.config/issuesync/config.toml or ./issuesync.toml,\n\
or export ISSUESYNC_GITHUB__TOKEN, ISSUESYNC_GITHUB__OWNER, ISSUESYNC_GITHUB__REPO,\n\
ISSUESYNC_LINEAR__API_KEY and ISSUESYNC_LINEAR__TEAM.\n\
Repository and team can also be passed with --repo and --team.";

/// Everything a sync run needs, checked up front.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub github_token: String,
    pub repo: RepoCoordinates,
    pub linear_api_key: String,
    pub team: String,
}

impl Config {
    /// Load configuration using the config crate's layered approach.
    ///
    /// Sources are loaded in order (later sources override earlier):
    /// 1. Built-in defaults
    /// 2. XDG config file (~/.config/issuesync/config.toml)
    /// 3. Local config file (./issuesync.toml)
    /// 4. Environment variables with ISSUESYNC_ prefix
    ///
    /// Legacy environment variables fill whatever is still unset. A source
    /// that fails to parse or deserialize is an error, never a fallback to
    /// defaults.
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(xdg_config) = Self::default_config_path()
            && xdg_config.exists()
        {
            tracing::debug!("Loading config from {:?}", xdg_config);
            builder = builder.add_source(
                File::from(xdg_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        let local_config = PathBuf::from("issuesync.toml");
        if local_config.exists() {
            tracing::debug!("Loading config from ./issuesync.toml");
            builder = builder.add_source(
                File::from(local_config)
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        builder = builder.add_source(Self::environment());

        let mut config = Self::from_builder(builder)?;
        config.apply_legacy_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn from_builder(
        builder: config::builder::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self, ConfigError> {
        builder
            .build()
            .and_then(|settings| settings.try_deserialize::<Config>())
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    /// `ISSUESYNC_SECTION__KEY` -> `section.key`.
    fn environment() -> Environment {
        Environment::with_prefix("ISSUESYNC")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
    }

    /// Fill unset credentials from `GITHUB_TOKEN` and `LINEAR_API_KEY`.
    fn apply_legacy_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if self.github.token.is_none() {
            self.github.token = lookup("GITHUB_TOKEN").filter(|v| !v.is_empty());
        }
        if self.linear.api_key.is_none() {
            self.linear.api_key = lookup("LINEAR_API_KEY").filter(|v| !v.is_empty());
        }
    }

    /// Check every required value at once.
    ///
    /// `repo` and `team` are CLI overrides for the configured values.
    pub fn validate(
        &self,
        repo: Option<&str>,
        team: Option<&str>,
    ) -> Result<ResolvedConfig, ConfigError> {
        let mut missing = Vec::new();

        let github_token = non_empty(self.github.token.as_deref());
        if github_token.is_none() {
            missing.push("github.token");
        }

        let repo = match repo {
            Some(slug) => Some(
                RepoCoordinates::parse(slug)
                    .map_err(|_| ConfigError::InvalidRepo(slug.to_string()))?,
            ),
            None => {
                let owner = non_empty(self.github.owner.as_deref());
                let name = non_empty(self.github.repo.as_deref());
                if owner.is_none() {
                    missing.push("github.owner");
                }
                if name.is_none() {
                    missing.push("github.repo");
                }
                owner.zip(name).map(|(o, n)| RepoCoordinates::new(o, n))
            }
        };

        let linear_api_key = non_empty(self.linear.api_key.as_deref());
        if linear_api_key.is_none() {
            missing.push("linear.api_key");
        }

        let team = non_empty(team).or_else(|| non_empty(self.linear.team.as_deref()));
        if team.is_none() {
            missing.push("linear.team");
        }

        match (github_token, repo, linear_api_key, team) {
            (Some(github_token), Some(repo), Some(linear_api_key), Some(team))
                if missing.is_empty() =>
            {
                Ok(ResolvedConfig {
                    github_token: github_token.to_string(),
                    repo,
                    linear_api_key: linear_api_key.to_string(),
                    team: team.to_string(),
                })
            }
            _ => Err(ConfigError::Missing(missing)),
        }
    }

    /// Override table keyed by lower-cased GitHub login.
    pub fn overrides(&self) -> HashMap<String, String> {
        self.overrides
            .iter()
            .map(|(handle, target)| (handle.trim().to_lowercase(), target.trim().to_string()))
            .collect()
    }

    /// Get the default config file path.
    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "issuesync").map(|dirs| dirs.config_dir().join("config.toml"))
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
