//! Release configuration, read and validated once at process entry.

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::error::ConfigError;
use crate::github::parse_owner_repo;
use crate::plugins::DEFAULT_PLUGINS_DIR;

/// Default timeout for the Claude subprocess (5 minutes).
const DEFAULT_CLAUDE_TIMEOUT_SECS: u64 = 300;

pub const PLUGINS_DIR_VAR: &str = "PLUGSHIP_PLUGINS_DIR";
pub const MARKETPLACE_URL_VAR: &str = "MARKETPLACE_API_URL";
pub const MARKETPLACE_KEY_VAR: &str = "MARKETPLACE_API_KEY";
pub const WEBHOOK_URL_VAR: &str = "SLACK_WEBHOOK_URL";
pub const GITHUB_REPOSITORY_VAR: &str = "GITHUB_REPOSITORY";
pub const CLAUDE_TIMEOUT_VAR: &str = "PLUGSHIP_CLAUDE_TIMEOUT";
pub const GIT_REMOTE_VAR: &str = "PLUGSHIP_GIT_REMOTE";

/// Marketplace endpoint and credentials.
#[derive(Debug, Clone)]
pub struct MarketplaceConfig {
    pub url: Url,
    pub token: String,
}

/// Everything the release pipeline needs from the environment.
#[derive(Debug, Clone)]
pub struct ReleaseConfig {
    pub repo_root: PathBuf,
    pub plugins_dir: String,
    pub marketplace: Option<MarketplaceConfig>,
    pub webhook_url: Option<Url>,
    /// `(owner, repo)` from `GITHUB_REPOSITORY`, if set.
    pub github_repository: Option<(String, String)>,
    pub claude_timeout: Duration,
    pub git_remote: String,
}

impl ReleaseConfig {
    /// Read configuration from the process environment.
    pub fn from_env(repo_root: &Path) -> Result<Self, ConfigError> {
        Self::from_lookup(repo_root, |name| std::env::var(name).ok())
    }

    /// Read configuration through `lookup`, treating blank values as unset.
    pub fn from_lookup<F>(repo_root: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if !repo_root.exists() {
            return Err(ConfigError::RepoNotFound(repo_root.display().to_string()));
        }

        let plugins_dir = plugins_dir_from_lookup(&lookup)?;

        let marketplace = match (var(MARKETPLACE_URL_VAR), var(MARKETPLACE_KEY_VAR)) {
            (Some(url), Some(token)) => Some(MarketplaceConfig {
                url: parse_http_url(MARKETPLACE_URL_VAR, &url)?,
                token,
            }),
            (Some(_), None) => {
                return Err(ConfigError::IncompleteCredentials {
                    var: MARKETPLACE_URL_VAR,
                    requires: MARKETPLACE_KEY_VAR,
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::IncompleteCredentials {
                    var: MARKETPLACE_KEY_VAR,
                    requires: MARKETPLACE_URL_VAR,
                });
            }
            (None, None) => None,
        };

        let webhook_url = var(WEBHOOK_URL_VAR)
            .map(|url| parse_http_url(WEBHOOK_URL_VAR, &url))
            .transpose()?;

        let github_repository = var(GITHUB_REPOSITORY_VAR)
            .map(|value| {
                parse_owner_repo(&value).map_err(|_| ConfigError::InvalidRepository(value.clone()))
            })
            .transpose()?;

        let claude_timeout = parse_timeout(var(CLAUDE_TIMEOUT_VAR).as_deref());

        let git_remote = var(GIT_REMOTE_VAR).unwrap_or_else(|| "origin".to_string());

        Ok(Self {
            repo_root: repo_root.to_path_buf(),
            plugins_dir,
            marketplace,
            webhook_url,
            github_repository,
            claude_timeout,
            git_remote,
        })
    }

    /// Marketplace settings, required for a real submission.
    pub fn require_marketplace(&self) -> Result<&MarketplaceConfig, ConfigError> {
        self.marketplace
            .as_ref()
            .ok_or(ConfigError::MissingVar(MARKETPLACE_URL_VAR))
    }
}

/// The plugins directory from the process environment.
///
/// For commands that need nothing else from [`ReleaseConfig`].
pub fn plugins_dir_from_env() -> Result<String, ConfigError> {
    plugins_dir_from_lookup(|name| std::env::var(name).ok())
}

/// Trimmed plugins directory without surrounding slashes; blank is an error.
fn plugins_dir_from_lookup<F>(lookup: F) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(PLUGINS_DIR_VAR) {
        Some(dir) => {
            let dir = dir.trim().trim_matches('/');
            if dir.is_empty() {
                return Err(ConfigError::Empty(PLUGINS_DIR_VAR));
            }
            Ok(dir.to_string())
        }
        None => Ok(DEFAULT_PLUGINS_DIR.to_string()),
    }
}

fn parse_http_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidUrl {
        var,
        value: value.to_string(),
    };

    let url = Url::parse(value).map_err(|_| invalid())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(invalid()),
    }
}

/// Parse the Claude timeout in seconds, warning on invalid values.
fn parse_timeout(value: Option<&str>) -> Duration {
    match value {
        Some(v) => match v.parse::<u64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => {
                warn!(
                    "Invalid {} value '{}', using default {}s",
                    CLAUDE_TIMEOUT_VAR, v, DEFAULT_CLAUDE_TIMEOUT_SECS
                );
                Duration::from_secs(DEFAULT_CLAUDE_TIMEOUT_SECS)
            }
        },
        None => Duration::from_secs(DEFAULT_CLAUDE_TIMEOUT_SECS),
    }
}
