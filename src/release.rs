//! Release pipeline: changelog, build, submit, tag, notify.

use std::path::PathBuf;

use dialoguer::Confirm;
use git2::Repository;
use semver::Version;
use tracing::{debug, error, info, warn};

use crate::build::ArtifactBuilder;
use crate::changelog::{ChangelogRequest, ResolvedChangelog, resolve_changelog};
use crate::claude::ClaudeExecutor;
use crate::config::{MARKETPLACE_URL_VAR, ReleaseConfig};
use crate::error::{ConfigError, GitError, ReleaseError};
use crate::git::executor;
use crate::git::tags::tag_exists;
use crate::git::{Git2DiffProvider, Git2TagRepository, release_tag_name, slugify};
use crate::marketplace::{Marketplace, Submission, SubmissionReceipt};
use crate::notify::{Notifier, release_message};
use crate::plugins::Plugin;

/// Per-invocation switches from the command line.
#[derive(Debug, Clone, Default)]
pub struct ReleaseOptions {
    /// Resolve and print the changelog, then stop.
    pub dry_run: bool,
    /// Skip the interactive confirmation before submitting.
    pub assume_yes: bool,
    /// Body of the pull request that triggered the release.
    pub pr_body: Option<String>,
    /// In [`run_releases`], pass over plugins whose release tag already exists.
    pub skip_released: bool,
}

/// Creates and publishes release tags.
pub trait ReleaseTagger {
    fn tag_and_push(&self, tag_name: &str) -> Result<(), GitError>;
}

/// [`ReleaseTagger`] using the system git binary.
pub struct GitCliTagger {
    pub repo_root: PathBuf,
    pub remote: String,
}

impl ReleaseTagger for GitCliTagger {
    fn tag_and_push(&self, tag_name: &str) -> Result<(), GitError> {
        executor::tag_and_push(&self.repo_root, tag_name, &self.remote)
    }
}

/// External services the pipeline talks to.
pub struct Collaborators<'a> {
    pub builder: &'a dyn ArtifactBuilder,
    pub marketplace: Option<&'a dyn Marketplace>,
    pub notifier: Option<&'a dyn Notifier>,
    pub generator: Option<&'a dyn ClaudeExecutor>,
    pub tagger: &'a dyn ReleaseTagger,
}

/// Result of releasing one plugin.
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub plugin: String,
    pub version: Version,
    pub tag: String,
    pub changelog: ResolvedChangelog,
    /// `None` for dry runs.
    pub receipt: Option<SubmissionReceipt>,
}

/// Load a plugin and resolve its release notes without side effects.
pub async fn prepare_changelog(
    config: &ReleaseConfig,
    plugin: &Plugin,
    pr_body: Option<&str>,
    generator: Option<&dyn ClaudeExecutor>,
) -> Result<ResolvedChangelog, ReleaseError> {
    let repo = open_repository(config)?;
    let project_path = plugin.project_path();

    let request = ChangelogRequest {
        display_name: plugin.display_name(),
        project_path: &project_path,
        version: &plugin.version,
        pr_body,
    };

    let resolved = resolve_changelog(
        &request,
        &Git2TagRepository::new(&repo),
        &Git2DiffProvider::new(&repo),
        generator,
    )
    .await?;

    Ok(resolved)
}

/// Release a single plugin.
pub async fn run_release(
    config: &ReleaseConfig,
    plugin_name: &str,
    options: &ReleaseOptions,
    collaborators: &Collaborators<'_>,
) -> Result<ReleaseOutcome, ReleaseError> {
    let plugin = Plugin::load(&config.repo_root, &config.plugins_dir, plugin_name)?;
    let display_name = plugin.display_name().to_string();
    let tag = release_tag_name(&display_name, &plugin.version);

    {
        let repo = open_repository(config)?;
        if tag_exists(&repo, &tag) {
            return Err(ReleaseError::TagAlreadyExists(tag));
        }
    }

    println!("Releasing {} v{} ({})", display_name, plugin.version, tag);

    let changelog = prepare_changelog(
        config,
        &plugin,
        options.pr_body.as_deref(),
        collaborators.generator,
    )
    .await?;

    let since = changelog.previous_tag.as_deref().unwrap_or("first release");
    println!("\nChangelog ({}, since {}):\n{}\n", changelog.source, since, changelog.text);

    if options.dry_run {
        println!("Dry run: would submit {} and push tag {}", plugin.dir_name, tag);
        return Ok(ReleaseOutcome {
            plugin: plugin.dir_name.clone(),
            version: plugin.version.clone(),
            tag,
            changelog,
            receipt: None,
        });
    }

    let marketplace = collaborators
        .marketplace
        .ok_or(ConfigError::MissingVar(MARKETPLACE_URL_VAR))?;

    let artifact = collaborators.builder.build(&plugin)?;
    debug!(artifact = %artifact.display(), "Built artifact");

    if !options.assume_yes {
        let proceed = Confirm::new()
            .with_prompt(format!("Submit {} v{} to the marketplace?", display_name, plugin.version))
            .default(true)
            .interact()
            .map_err(|_| ReleaseError::Cancelled)?;
        if !proceed {
            return Err(ReleaseError::Cancelled);
        }
    }

    let submission = Submission {
        slug: slugify(&display_name),
        display_name: display_name.clone(),
        package_name: plugin.manifest.name.clone(),
        version: plugin.version.clone(),
        changelog: changelog.text.clone(),
        artifact,
    };

    let receipt = marketplace.submit(&submission).await?;
    println!("✓ Submitted {} v{} (status: {})", display_name, receipt.version, receipt.status);

    collaborators.tagger.tag_and_push(&tag)?;
    println!("✓ Tagged {}", tag);

    if let Some(notifier) = collaborators.notifier {
        let text = release_message(&display_name, &plugin.version, &changelog.text, Some(&receipt));
        if let Err(e) = notifier.notify(&text).await {
            warn!(plugin = %plugin.dir_name, error = %e, "Failed to send release notification");
        }
    }

    Ok(ReleaseOutcome {
        plugin: plugin.dir_name.clone(),
        version: plugin.version.clone(),
        tag,
        changelog,
        receipt: Some(receipt),
    })
}

/// Release several plugins in order, stopping at the first failure.
///
/// With `skip_released`, a plugin whose current version is already tagged
/// is reported and passed over instead of failing the batch.
pub async fn run_releases(
    config: &ReleaseConfig,
    plugin_names: &[String],
    options: &ReleaseOptions,
    collaborators: &Collaborators<'_>,
) -> Result<Vec<ReleaseOutcome>, ReleaseError> {
    let mut outcomes = Vec::with_capacity(plugin_names.len());

    for name in plugin_names {
        match run_release(config, name, options, collaborators).await {
            Ok(outcome) => outcomes.push(outcome),
            Err(ReleaseError::TagAlreadyExists(tag)) if options.skip_released => {
                info!(plugin = %name, tag = %tag, "Skipping already released plugin");
                println!("Skipping {}: {} already exists", name, tag);
            }
            Err(e) => {
                error!(plugin = %name, error = %e, "Release failed");
                return Err(e);
            }
        }
    }

    Ok(outcomes)
}

fn open_repository(config: &ReleaseConfig) -> Result<Repository, GitError> {
    Repository::open(&config.repo_root).map_err(|source| GitError::OpenRepository {
        path: config.repo_root.display().to_string(),
        source,
    })
}
