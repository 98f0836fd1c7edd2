//! GitHub token discovery.
//!
//! CI runners export `GITHUB_TOKEN`; developer machines usually have the gh
//! CLI logged in. Environment variables win so CI never shells out.

use std::process::Command;

use tracing::debug;

use crate::error::GitHubError;

const TOKEN_VARS: [&str; 2] = ["GITHUB_TOKEN", "GH_TOKEN"];

/// Get a GitHub token from the environment, then from `gh auth token`.
pub fn get_github_token() -> Result<String, GitHubError> {
    resolve_github_token(|name| std::env::var(name).ok(), token_from_gh_cli)
}

/// Token resolution with injectable sources.
pub fn resolve_github_token<L, G>(lookup: L, gh_cli: G) -> Result<String, GitHubError>
where
    L: Fn(&str) -> Option<String>,
    G: FnOnce() -> Option<String>,
{
    for var in TOKEN_VARS {
        if let Some(token) = lookup(var).filter(|t| !t.trim().is_empty()) {
            debug!(source = var, "Using GitHub token from environment");
            return Ok(token.trim().to_string());
        }
    }

    gh_cli().ok_or(GitHubError::AuthenticationFailed)
}

/// Ask an authenticated gh CLI for its token.
fn token_from_gh_cli() -> Option<String> {
    let output = Command::new("gh").args(["auth", "token"]).output().ok()?;

    if !output.status.success() {
        return None;
    }

    let token = String::from_utf8_lossy(&output.stdout).trim().to_string();
    if token.is_empty() {
        None
    } else {
        debug!("Using GitHub token from gh CLI");
        Some(token)
    }
}
