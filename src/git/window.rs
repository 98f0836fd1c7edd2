//! Diff and commit log of a plugin since its last release.

use std::fmt;
use std::path::Path;

use git2::{Diff, DiffFormat, DiffOptions, Oid, Repository, Sort, Tree};
use tracing::{debug, warn};

use crate::error::GitError;

/// Maximum characters of diff text handed to the changelog generator.
pub const MAX_DIFF_CHARS: usize = 50_000;

/// Where the change window starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowBase {
    /// Everything after the given release tag.
    Tag(String),
    /// The plugin's whole history, starting at the commit that added it.
    Introduced(String),
    /// No introducing commit found: all current content counts as new.
    WorkingTree,
}

impl fmt::Display for WindowBase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowBase::Tag(tag) => write!(f, "{tag}"),
            WindowBase::Introduced(sha) => write!(f, "{} (first commit)", short_sha(sha)),
            WindowBase::WorkingTree => write!(f, "working tree"),
        }
    }
}

/// Diff and one-line commit log for a plugin over a change window.
#[derive(Debug, Clone)]
pub struct ChangeWindow {
    pub base: WindowBase,
    pub diff_text: String,
    pub commit_log: String,
    pub truncated: bool,
}

/// Source of diffs and commit logs scoped to a path.
///
/// This abstraction allows the windowing policy to be tested without a repository.
#[cfg_attr(test, mockall::automock)]
pub trait DiffProvider {
    /// Oldest commit whose tree introduced `path`, if history contains one.
    fn introducing_commit(&self, path: &str) -> Result<Option<String>, GitError>;

    /// Unified diff of `path` from `base` to the current revision.
    fn diff(&self, path: &str, base: &WindowBase) -> Result<String, GitError>;

    /// `<short-sha> <summary>` lines, newest first, for commits after `base` touching `path`.
    fn commit_log(&self, path: &str, base: &WindowBase) -> Result<String, GitError>;
}

/// Compute the change window of `project_path` since `since_tag`.
///
/// With no tag the window covers the plugin's entire history. Diff failures
/// propagate; a failed commit log is logged and left empty.
pub fn change_window_with(
    provider: &dyn DiffProvider,
    project_path: &str,
    since_tag: Option<&str>,
) -> Result<ChangeWindow, GitError> {
    let base = match since_tag {
        Some(tag) => WindowBase::Tag(tag.to_string()),
        None => match provider.introducing_commit(project_path) {
            Ok(Some(sha)) => WindowBase::Introduced(sha),
            Ok(None) => {
                debug!(path = %project_path, "No commit introduces path, diffing working tree");
                WindowBase::WorkingTree
            }
            Err(e) => {
                warn!(path = %project_path, error = %e, "History search failed, diffing working tree");
                WindowBase::WorkingTree
            }
        },
    };

    let raw_diff = provider.diff(project_path, &base)?;
    let (diff_text, truncated) = truncate_diff(&raw_diff, MAX_DIFF_CHARS);

    let commit_log = provider.commit_log(project_path, &base).unwrap_or_else(|e| {
        warn!(path = %project_path, error = %e, "Could not read commit log");
        String::new()
    });

    Ok(ChangeWindow {
        base,
        diff_text,
        commit_log,
        truncated,
    })
}

/// Compute the change window of `project_path` in the repository at `repo_root`.
pub fn change_window(
    project_path: &str,
    since_tag: Option<&str>,
    repo_root: &Path,
) -> Result<ChangeWindow, GitError> {
    let repo = Repository::open(repo_root).map_err(|source| GitError::OpenRepository {
        path: repo_root.display().to_string(),
        source,
    })?;

    change_window_with(&Git2DiffProvider::new(&repo), project_path, since_tag)
}

/// Cap `diff` at `max_chars` characters, appending a marker when cut.
pub fn truncate_diff(diff: &str, max_chars: usize) -> (String, bool) {
    match diff.char_indices().nth(max_chars) {
        Some((cut, _)) => (
            format!("{}\n\n[diff truncated at {max_chars} characters]", &diff[..cut]),
            true,
        ),
        None => (diff.to_string(), false),
    }
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

/// [`DiffProvider`] backed by a git2 repository.
pub struct Git2DiffProvider<'r> {
    repo: &'r Repository,
}

impl<'r> Git2DiffProvider<'r> {
    pub fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }

    fn head_tree(&self) -> Result<Tree<'r>, GitError> {
        self.repo
            .head()
            .and_then(|head| head.peel_to_tree())
            .map_err(|e| GitError::ReferenceNotFound("HEAD".to_string(), e))
    }

    fn tag_tree(&self, tag: &str) -> Result<Tree<'r>, GitError> {
        self.repo
            .revparse_single(tag)
            .and_then(|obj| obj.peel_to_tree())
            .map_err(|e| GitError::ReferenceNotFound(tag.to_string(), e))
    }

    fn tag_commit(&self, tag: &str) -> Result<Oid, GitError> {
        self.repo
            .revparse_single(tag)
            .and_then(|obj| obj.peel_to_commit())
            .map(|commit| commit.id())
            .map_err(|e| GitError::ReferenceNotFound(tag.to_string(), e))
    }

    /// Tree entry id of `path` in a commit, or `None` if absent.
    fn path_id(&self, tree: &Tree<'_>, path: &str) -> Option<Oid> {
        tree.get_path(Path::new(path)).ok().map(|entry| entry.id())
    }

    /// Whether `commit` changed `path` relative to its first parent.
    fn touches(&self, commit: &git2::Commit<'_>, path: &str) -> Result<bool, GitError> {
        let tree = commit.tree().map_err(GitError::RevwalkError)?;
        let current = self.path_id(&tree, path);

        let previous = match commit.parent(0) {
            Ok(parent) => {
                let parent_tree = parent.tree().map_err(GitError::RevwalkError)?;
                self.path_id(&parent_tree, path)
            }
            Err(_) => None,
        };

        Ok(current != previous)
    }
}

impl DiffProvider for Git2DiffProvider<'_> {
    fn introducing_commit(&self, path: &str) -> Result<Option<String>, GitError> {
        let mut revwalk = self.repo.revwalk().map_err(GitError::RevwalkError)?;
        if revwalk.push_head().is_err() {
            // Unborn HEAD: nothing has been committed yet.
            return Ok(None);
        }
        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)
            .map_err(GitError::RevwalkError)?;

        for oid in revwalk {
            let oid = oid.map_err(GitError::RevwalkError)?;
            let commit = self.repo.find_commit(oid).map_err(GitError::RevwalkError)?;
            let tree = commit.tree().map_err(GitError::RevwalkError)?;

            if self.path_id(&tree, path).is_none() {
                continue;
            }

            let in_parent = match commit.parent(0) {
                Ok(parent) => {
                    let parent_tree = parent.tree().map_err(GitError::RevwalkError)?;
                    self.path_id(&parent_tree, path).is_some()
                }
                Err(_) => false,
            };

            if !in_parent {
                debug!(path = %path, commit = %oid, "Found introducing commit");
                return Ok(Some(oid.to_string()));
            }
        }

        Ok(None)
    }

    fn diff(&self, path: &str, base: &WindowBase) -> Result<String, GitError> {
        let diff_failed = |source| GitError::DiffFailed {
            path: path.to_string(),
            source,
        };

        let mut opts = DiffOptions::new();
        opts.pathspec(path);

        let diff = match base {
            WindowBase::Tag(tag) => {
                let from = self.tag_tree(tag)?;
                let to = self.head_tree()?;
                self.repo
                    .diff_tree_to_tree(Some(&from), Some(&to), Some(&mut opts))
                    .map_err(diff_failed)?
            }
            WindowBase::Introduced(sha) => {
                let oid = Oid::from_str(sha).map_err(diff_failed)?;
                let commit = self.repo.find_commit(oid).map_err(diff_failed)?;
                let from = match commit.parent(0) {
                    Ok(parent) => Some(parent.tree().map_err(diff_failed)?),
                    Err(_) => None,
                };
                let to = self.head_tree()?;
                self.repo
                    .diff_tree_to_tree(from.as_ref(), Some(&to), Some(&mut opts))
                    .map_err(diff_failed)?
            }
            WindowBase::WorkingTree => {
                if self.repo.workdir().is_none() {
                    return Err(GitError::BareRepository);
                }
                opts.include_untracked(true)
                    .recurse_untracked_dirs(true)
                    .show_untracked_content(true);
                self.repo
                    .diff_tree_to_workdir(None, Some(&mut opts))
                    .map_err(diff_failed)?
            }
        };

        render_patch(&diff).map_err(diff_failed)
    }

    fn commit_log(&self, path: &str, base: &WindowBase) -> Result<String, GitError> {
        let mut revwalk = self.repo.revwalk().map_err(GitError::RevwalkError)?;
        if revwalk.push_head().is_err() {
            return Ok(String::new());
        }
        revwalk
            .set_sorting(Sort::TOPOLOGICAL | Sort::TIME)
            .map_err(GitError::RevwalkError)?;

        if let WindowBase::Tag(tag) = base {
            revwalk
                .hide(self.tag_commit(tag)?)
                .map_err(GitError::RevwalkError)?;
        }

        let mut lines = Vec::new();
        for oid in revwalk {
            let oid = oid.map_err(GitError::RevwalkError)?;
            let commit = self.repo.find_commit(oid).map_err(GitError::RevwalkError)?;

            if self.touches(&commit, path)? {
                let sha = oid.to_string();
                let summary = commit.summary().unwrap_or("").trim().to_string();
                lines.push(format!("{} {}", short_sha(&sha), summary));
            }
        }

        Ok(lines.join("\n"))
    }
}

/// Render a diff in unified patch format.
fn render_patch(diff: &Diff<'_>) -> Result<String, git2::Error> {
    let mut text = String::new();

    diff.print(DiffFormat::Patch, |_delta, _hunk, line| {
        let origin = line.origin();
        if origin == '+' || origin == '-' || origin == ' ' {
            text.push(origin);
        }
        text.push_str(&String::from_utf8_lossy(line.content()));
        true
    })?;

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_diff_under_limit() {
        let (text, truncated) = truncate_diff("+hello\n", 100);
        assert_eq!(text, "+hello\n");
        assert!(!truncated);
    }

    #[test]
    fn test_truncate_diff_exact_limit_not_truncated() {
        let (text, truncated) = truncate_diff("abcde", 5);
        assert_eq!(text, "abcde");
        assert!(!truncated);
    }

    #[test]
    fn test_truncate_diff_over_limit() {
        let (text, truncated) = truncate_diff("abcdefgh", 5);
        assert!(truncated);
        assert!(text.starts_with("abcde\n\n[diff truncated"));
    }

    #[test]
    fn test_truncate_diff_counts_chars_not_bytes() {
        let (text, truncated) = truncate_diff("ééééé", 3);
        assert!(truncated);
        assert!(text.starts_with("ééé\n"));
    }

    #[test]
    fn test_window_with_tag_skips_history_search() {
        let mut mock = MockDiffProvider::new();
        mock.expect_introducing_commit().never();
        mock.expect_diff()
            .withf(|path, base| path == "plugins/airtable" && *base == WindowBase::Tag("airtable-v1.0.0".into()))
            .returning(|_, _| Ok("+change\n".to_string()));
        mock.expect_commit_log()
            .returning(|_, _| Ok("abc1234 fix: thing".to_string()));

        let window = change_window_with(&mock, "plugins/airtable", Some("airtable-v1.0.0")).unwrap();
        assert_eq!(window.base, WindowBase::Tag("airtable-v1.0.0".into()));
        assert_eq!(window.diff_text, "+change\n");
        assert_eq!(window.commit_log, "abc1234 fix: thing");
        assert!(!window.truncated);
    }

    #[test]
    fn test_window_without_tag_uses_introducing_commit() {
        let mut mock = MockDiffProvider::new();
        mock.expect_introducing_commit()
            .returning(|_| Ok(Some("0123456789abcdef".to_string())));
        mock.expect_diff()
            .withf(|_, base| matches!(base, WindowBase::Introduced(sha) if sha == "0123456789abcdef"))
            .returning(|_, _| Ok(String::new()));
        mock.expect_commit_log().returning(|_, _| Ok(String::new()));

        let window = change_window_with(&mock, "plugins/new", None).unwrap();
        assert_eq!(window.base, WindowBase::Introduced("0123456789abcdef".into()));
    }

    #[test]
    fn test_window_without_history_falls_back_to_working_tree() {
        let mut mock = MockDiffProvider::new();
        mock.expect_introducing_commit().returning(|_| Ok(None));
        mock.expect_diff()
            .withf(|_, base| *base == WindowBase::WorkingTree)
            .returning(|_, _| Ok("+new file\n".to_string()));
        mock.expect_commit_log().returning(|_, _| Ok(String::new()));

        let window = change_window_with(&mock, "plugins/new", None).unwrap();
        assert_eq!(window.base, WindowBase::WorkingTree);
        assert_eq!(window.diff_text, "+new file\n");
    }

    #[test]
    fn test_diff_failure_is_hard_error() {
        let mut mock = MockDiffProvider::new();
        mock.expect_diff().returning(|path, _| {
            Err(GitError::DiffFailed {
                path: path.to_string(),
                source: git2::Error::from_str("bad object"),
            })
        });
        mock.expect_commit_log().never();

        let result = change_window_with(&mock, "plugins/x", Some("x-v1.0.0"));
        assert!(matches!(result, Err(GitError::DiffFailed { .. })));
    }

    #[test]
    fn test_commit_log_failure_is_soft() {
        let mut mock = MockDiffProvider::new();
        mock.expect_diff().returning(|_, _| Ok("+a\n".to_string()));
        mock.expect_commit_log()
            .returning(|_, _| Err(GitError::RevwalkError(git2::Error::from_str("walk failed"))));

        let window = change_window_with(&mock, "plugins/x", Some("x-v1.0.0")).unwrap();
        assert_eq!(window.commit_log, "");
        assert_eq!(window.diff_text, "+a\n");
    }

    #[test]
    fn test_large_diff_is_truncated() {
        let mut mock = MockDiffProvider::new();
        mock.expect_diff()
            .returning(|_, _| Ok("x".repeat(MAX_DIFF_CHARS + 10)));
        mock.expect_commit_log().returning(|_, _| Ok(String::new()));

        let window = change_window_with(&mock, "plugins/x", Some("x-v1.0.0")).unwrap();
        assert!(window.truncated);
        assert!(window.diff_text.ends_with("[diff truncated at 50000 characters]"));
    }

    #[test]
    fn test_window_base_display() {
        assert_eq!(WindowBase::Tag("a-v1.0.0".into()).to_string(), "a-v1.0.0");
        assert_eq!(
            WindowBase::Introduced("0123456789".into()).to_string(),
            "0123456 (first commit)"
        );
        assert_eq!(WindowBase::WorkingTree.to_string(), "working tree");
    }
}
