//! plugship - release automation for plugins living in a monorepo.
//!
//! # Overview
//!
//! plugship works out which plugins a change touched, resolves release notes
//! from the pull request's `### Changelog` section (or generates them with
//! the Claude Code CLI from the diff since the plugin's last release tag),
//! submits the packed plugin to the marketplace API, tags the release in git,
//! and announces it on a chat webhook.

pub mod build;
pub mod changelog;
pub mod claude;
pub mod config;
pub mod error;
pub mod git;
pub mod github;
pub mod marketplace;
pub mod notify;
pub mod plugins;
pub mod release;

// Re-export commonly used types
pub use changelog::{ChangelogSource, ResolvedChangelog, extract_changelog};
pub use config::ReleaseConfig;
pub use error::{
    BuildError, ClaudeError, ConfigError, GitError, GitHubError, ManifestError, MarketplaceError,
    NotifyError, ReleaseError,
};
pub use git::{ChangeWindow, change_window, latest_tag};
pub use plugins::{parse_changed_plugins, parse_changed_projects};
