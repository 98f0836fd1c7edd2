//! Pull request body lookup via octocrab.

use octocrab::Octocrab;
use tracing::debug;

use crate::error::GitHubError;

/// Fetch the description of pull request `number` using a token.
pub async fn fetch_pr_body(
    token: &str,
    owner: &str,
    repo: &str,
    number: u64,
) -> Result<Option<String>, GitHubError> {
    let octocrab = Octocrab::builder()
        .personal_token(token.to_string())
        .build()
        .map_err(|e| GitHubError::FetchPullRequest(Box::new(e)))?;

    fetch_pr_body_with_client(&octocrab, owner, repo, number).await
}

/// Fetch a PR description using a pre-configured octocrab client.
///
/// This allows dependency injection for testing with mock servers.
pub async fn fetch_pr_body_with_client(
    octocrab: &Octocrab,
    owner: &str,
    repo: &str,
    number: u64,
) -> Result<Option<String>, GitHubError> {
    let pr = match octocrab.pulls(owner, repo).get(number).await {
        Ok(pr) => pr,
        Err(e) => {
            // Check error content using both Display and Debug output
            // to handle different octocrab error formats
            let err_display = e.to_string();
            let err_debug = format!("{:?}", e);

            if err_display.to_lowercase().contains("rate limit")
                || err_debug.to_lowercase().contains("rate limit")
            {
                return Err(GitHubError::RateLimited {
                    reset_time: "unknown".to_string(),
                });
            }
            if err_display.contains("Not Found") || err_debug.contains("Not Found") {
                return Err(GitHubError::PullRequestNotFound {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                    number,
                });
            }
            return Err(GitHubError::FetchPullRequest(Box::new(e)));
        }
    };

    // Never truncated: the changelog section can sit past any fixed cap.
    debug!(
        number,
        body_len = pr.body.as_deref().map_or(0, str::len),
        "Fetched pull request"
    );
    Ok(pr.body)
}

/// Extract owner and repo from a git remote URL.
pub fn parse_github_remote(url: &str) -> Result<(String, String), GitHubError> {
    // Handle SSH format: git@github.com:owner/repo.git
    if let Some(path) = url.strip_prefix("git@github.com:") {
        return parse_owner_repo(path);
    }

    // Handle HTTPS format: https://github.com/owner/repo.git
    if url.contains("github.com/") {
        let path = url
            .split("github.com/")
            .nth(1)
            .ok_or(GitHubError::InvalidRepositoryUrl)?;
        return parse_owner_repo(path);
    }

    Err(GitHubError::InvalidRepositoryUrl)
}

/// Split an `owner/repo` path, tolerating a `.git` suffix.
pub fn parse_owner_repo(path: &str) -> Result<(String, String), GitHubError> {
    let path = path.strip_suffix(".git").unwrap_or(path);
    let mut parts = path.split('/');

    match (parts.next(), parts.next()) {
        (Some(owner), Some(repo)) if !owner.is_empty() && !repo.is_empty() => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(GitHubError::InvalidRepositoryUrl),
    }
}
