//! GitHub API operations using octocrab.

pub mod auth;
pub mod prs;

pub use auth::get_github_token;
pub use prs::{fetch_pr_body, fetch_pr_body_with_client, parse_github_remote, parse_owner_repo};
