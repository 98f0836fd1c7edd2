//! Release tagging through the system `git` binary.
//!
//! Shelling out inherits the user's git config, SSH agent, and credential
//! store, which libgit2 does not.

use std::path::Path;
use std::process::Command;

use tracing::{info, warn};

use crate::error::GitError;

/// Create an annotated release tag at HEAD and push it to `remote`.
///
/// If the push fails the local tag is deleted again so a retry starts clean.
pub fn tag_and_push(repo_root: &Path, tag_name: &str, remote: &str) -> Result<(), GitError> {
    create_release_tag(repo_root, tag_name)?;

    if let Err(e) = push_tag(repo_root, remote, tag_name) {
        if let Err(cleanup) = delete_local_tag(repo_root, tag_name) {
            warn!(tag = %tag_name, error = %cleanup, "Failed to delete local tag after push failure");
        }
        return Err(e);
    }

    Ok(())
}

/// Create an annotated tag `tag_name` at HEAD.
pub fn create_release_tag(repo_root: &Path, tag_name: &str) -> Result<(), GitError> {
    let message = format!("Release {tag_name}");
    run_git(repo_root, &["tag", "-a", tag_name, "-m", &message], "create tag")?;
    info!(tag = %tag_name, "Created release tag");
    Ok(())
}

/// Push a single tag to `remote`.
pub fn push_tag(repo_root: &Path, remote: &str, tag_name: &str) -> Result<(), GitError> {
    let refspec = format!("refs/tags/{tag_name}");
    run_git(repo_root, &["push", remote, &refspec], "push tag")?;
    info!(tag = %tag_name, remote = %remote, "Pushed release tag");
    Ok(())
}

/// Delete a local tag, used when pushing it failed.
pub fn delete_local_tag(repo_root: &Path, tag_name: &str) -> Result<(), GitError> {
    run_git(repo_root, &["tag", "-d", tag_name], "delete tag")
}

/// Run a git command in `repo_root` and return success or a descriptive error.
fn run_git(repo_root: &Path, args: &[&str], operation: &str) -> Result<(), GitError> {
    let output = Command::new("git")
        .arg("-C")
        .arg(repo_root)
        .args(args)
        .output()
        .map_err(|source| GitError::SpawnFailed {
            operation: operation.to_string(),
            source,
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(GitError::CommandFailed {
            operation: operation.to_string(),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(())
}
