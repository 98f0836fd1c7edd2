//! Decide the release notes for a plugin version.
//!
//! Author-written notes from the PR body win. Otherwise the change window
//! since the last release tag is summarised by Claude, and if that fails the
//! commit log itself becomes the changelog.

use std::fmt;

use semver::Version;
use tracing::{info, warn};

use crate::claude::{ClaudeExecutor, GenerationInput, build_changelog_prompt, generate_with_retry};
use crate::error::GitError;
use crate::git::{ChangeWindow, DiffProvider, TagRepository, change_window_with, latest_tag_in};

use super::section::extract_changelog;

/// Used when neither a PR, the generator, nor history produced anything.
const INITIAL_RELEASE_NOTE: &str = "- Initial release";
const MAINTENANCE_NOTE: &str = "- Maintenance release";

/// Where the release notes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangelogSource {
    PullRequest,
    Generated,
    CommitLog,
    Placeholder,
}

impl fmt::Display for ChangelogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ChangelogSource::PullRequest => "pull request",
            ChangelogSource::Generated => "generated",
            ChangelogSource::CommitLog => "commit log",
            ChangelogSource::Placeholder => "placeholder",
        };
        f.write_str(label)
    }
}

/// What to resolve release notes for.
#[derive(Debug, Clone)]
pub struct ChangelogRequest<'a> {
    pub display_name: &'a str,
    /// Plugin directory relative to the repository root.
    pub project_path: &'a str,
    pub version: &'a Version,
    pub pr_body: Option<&'a str>,
}

/// Release notes plus the context they were derived from.
#[derive(Debug, Clone)]
pub struct ResolvedChangelog {
    pub text: String,
    pub source: ChangelogSource,
    pub previous_tag: Option<String>,
    pub window: Option<ChangeWindow>,
}

/// Resolve release notes for one plugin version.
///
/// `generator` is `None` when no LLM is available, which skips straight to
/// the commit-log fallback. Only a failed diff is an error.
pub async fn resolve_changelog(
    request: &ChangelogRequest<'_>,
    tags: &dyn TagRepository,
    diffs: &dyn DiffProvider,
    generator: Option<&dyn ClaudeExecutor>,
) -> Result<ResolvedChangelog, GitError> {
    if let Some(text) = extract_changelog(request.pr_body) {
        info!(plugin = %request.display_name, "Using changelog from pull request");
        return Ok(ResolvedChangelog {
            text,
            source: ChangelogSource::PullRequest,
            previous_tag: None,
            window: None,
        });
    }

    let previous_tag = latest_tag_in(tags, request.display_name);
    let window = change_window_with(diffs, request.project_path, previous_tag.as_deref())?;

    if let Some(generator) = generator {
        let input = GenerationInput {
            plugin_name: request.display_name,
            version: request.version.to_string(),
            previous_tag: previous_tag.as_deref(),
            window: &window,
        };
        let prompt = build_changelog_prompt(&input);

        match generate_with_retry(&prompt, generator).await {
            Ok(text) => {
                info!(plugin = %request.display_name, "Generated changelog");
                return Ok(ResolvedChangelog {
                    text,
                    source: ChangelogSource::Generated,
                    previous_tag,
                    window: Some(window),
                });
            }
            Err(e) => {
                warn!(plugin = %request.display_name, error = %e, "Changelog generation failed, using commit log");
            }
        }
    }

    let (text, source) = match commit_log_bullets(&window.commit_log) {
        Some(text) => (text, ChangelogSource::CommitLog),
        None if previous_tag.is_none() => (INITIAL_RELEASE_NOTE.to_string(), ChangelogSource::Placeholder),
        None => (MAINTENANCE_NOTE.to_string(), ChangelogSource::Placeholder),
    };

    Ok(ResolvedChangelog {
        text,
        source,
        previous_tag,
        window: Some(window),
    })
}

/// Turn `<sha> <summary>` lines into `- <summary>` bullets.
pub fn commit_log_bullets(commit_log: &str) -> Option<String> {
    let bullets: Vec<String> = commit_log
        .lines()
        .map(|line| line.split_once(' ').map_or(line, |(_, summary)| summary).trim())
        .filter(|summary| !summary.is_empty())
        .map(|summary| format!("- {summary}"))
        .collect();

    if bullets.is_empty() {
        None
    } else {
        Some(bullets.join("\n"))
    }
}
