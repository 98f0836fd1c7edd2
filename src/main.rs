//! plugship - CLI entry point.

use std::io::{IsTerminal, Read};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use git2::Repository;
use tracing_subscriber::EnvFilter;

use plugship::build::NpmArtifactBuilder;
use plugship::claude::{ClaudeExecutor, DefaultExecutor, check_claude_installed};
use plugship::config::ReleaseConfig;
use plugship::extract_changelog;
use plugship::github::{fetch_pr_body, get_github_token, parse_github_remote};
use plugship::marketplace::{Marketplace, MarketplaceClient};
use plugship::notify::{Notifier, WebhookNotifier};
use plugship::plugins::{Plugin, list_plugins, parse_changed_projects};
use plugship::release::{Collaborators, GitCliTagger, ReleaseOptions, prepare_changelog, run_releases};

/// Release plugins from a monorepo to the marketplace.
#[derive(Parser, Debug)]
#[command(name = "plugship")]
#[command(about = "Release plugins from a monorepo to the marketplace")]
#[command(version)]
struct Cli {
    /// Repository root
    #[arg(long, global = true, default_value = ".")]
    repo: PathBuf,

    /// Show progress logs
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List plugins touched by a set of changed files (args or stdin)
    Changed {
        /// Changed file paths; read from stdin when omitted
        paths: Vec<String>,

        /// Print a JSON array instead of one name per line
        #[arg(long)]
        json: bool,
    },

    /// Print the changelog section of a PR body (file or stdin)
    Extract {
        /// File containing the PR body; read from stdin when omitted
        file: Option<PathBuf>,
    },

    /// Resolve and print the release notes for a plugin
    Changelog {
        /// Plugin directory name
        plugin: String,

        #[command(flatten)]
        source: PrSource,

        /// Do not call Claude; fall back to the commit log
        #[arg(long)]
        no_generate: bool,
    },

    /// Build, submit, tag, and announce plugins
    Release {
        /// Plugin directory names (all plugins with --all)
        plugins: Vec<String>,

        /// Release every plugin under the plugins directory
        #[arg(long, conflicts_with = "plugins")]
        all: bool,

        #[command(flatten)]
        source: PrSource,

        /// Resolve the changelog and stop before building
        #[arg(long)]
        dry_run: bool,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,

        /// Only run `npm pack`, not `npm run build`
        #[arg(long)]
        skip_build_script: bool,

        /// Do not call Claude; fall back to the commit log
        #[arg(long)]
        no_generate: bool,
    },
}

/// Where the pull request body comes from.
#[derive(Args, Debug)]
struct PrSource {
    /// Pull request number to read the changelog from
    #[arg(long)]
    pr: Option<u64>,

    /// File containing the pull request body
    #[arg(long, conflicts_with = "pr")]
    pr_body_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Changed { paths, json } => {
            let raw = if paths.is_empty() {
                read_stdin()?
            } else {
                paths.join("\n")
            };
            let plugins_dir =
                plugship::config::plugins_dir_from_env().context("Invalid configuration")?;
            let names = parse_changed_projects(&raw, &plugins_dir);

            if json {
                println!("{}", serde_json::to_string(&names)?);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }

        Command::Extract { file } => {
            let body = match file {
                Some(path) => std::fs::read_to_string(&path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => read_stdin()?,
            };
            if let Some(section) = extract_changelog(Some(&body)) {
                println!("{section}");
            }
        }

        Command::Changelog {
            plugin,
            source,
            no_generate,
        } => {
            let config = ReleaseConfig::from_env(&cli.repo).context("Invalid configuration")?;
            let plugin = Plugin::load(&config.repo_root, &config.plugins_dir, &plugin)?;
            let pr_body = load_pr_body(&config, &source).await?;
            let generator = claude_executor(&config, no_generate).await;

            let resolved = prepare_changelog(
                &config,
                &plugin,
                pr_body.as_deref(),
                generator.as_ref().map(|g| g as &dyn ClaudeExecutor),
            )
            .await
            .context("Failed to resolve changelog")?;

            eprintln!(
                "{} v{} ({}, since {})",
                plugin.display_name(),
                plugin.version,
                resolved.source,
                resolved.previous_tag.as_deref().unwrap_or("first release")
            );
            println!("{}", resolved.text);
        }

        Command::Release {
            plugins,
            all,
            source,
            dry_run,
            yes,
            skip_build_script,
            no_generate,
        } => {
            let config = ReleaseConfig::from_env(&cli.repo).context("Invalid configuration")?;

            let names = if all {
                list_plugins(&config.repo_root, &config.plugins_dir)?
            } else {
                plugins
            };
            if names.is_empty() {
                bail!("No plugins to release. Pass plugin names or --all.");
            }

            let marketplace = if dry_run {
                None
            } else {
                let settings = config.require_marketplace()?;
                Some(MarketplaceClient::new(settings.url.clone(), settings.token.clone()))
            };
            let notifier = config.webhook_url.clone().map(WebhookNotifier::new);
            let generator = claude_executor(&config, no_generate).await;
            let builder = NpmArtifactBuilder {
                run_build_script: !skip_build_script,
            };
            let tagger = GitCliTagger {
                repo_root: config.repo_root.clone(),
                remote: config.git_remote.clone(),
            };

            let collaborators = Collaborators {
                builder: &builder,
                marketplace: marketplace.as_ref().map(|m| m as &dyn Marketplace),
                notifier: notifier.as_ref().map(|n| n as &dyn Notifier),
                generator: generator.as_ref().map(|g| g as &dyn ClaudeExecutor),
                tagger: &tagger,
            };

            let options = ReleaseOptions {
                dry_run,
                assume_yes: yes || !std::io::stdin().is_terminal(),
                pr_body: load_pr_body(&config, &source).await?,
                skip_released: all,
            };

            let outcomes = run_releases(&config, &names, &options, &collaborators)
                .await
                .context("Release failed")?;
            if all && outcomes.is_empty() {
                println!("Every plugin is already released.");
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "plugship=info" } else { "plugship=warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_stdin() -> Result<String> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("Failed to read stdin")?;
    Ok(input)
}

/// The Claude executor, or `None` when disabled or not installed.
async fn claude_executor(config: &ReleaseConfig, disabled: bool) -> Option<DefaultExecutor> {
    if disabled {
        return None;
    }

    match check_claude_installed().await {
        Ok(()) => Some(DefaultExecutor {
            timeout: config.claude_timeout,
        }),
        Err(e) => {
            eprintln!("Warning: {e}. Falling back to the commit log for generated changelogs.");
            None
        }
    }
}

/// Read the PR body from a file or from GitHub.
async fn load_pr_body(config: &ReleaseConfig, source: &PrSource) -> Result<Option<String>> {
    if let Some(path) = &source.pr_body_file {
        let body = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        return Ok(Some(body));
    }

    let Some(number) = source.pr else {
        return Ok(None);
    };

    let (owner, repo) = match &config.github_repository {
        Some(pair) => pair.clone(),
        None => github_repo_from_remote(config)?,
    };

    let token = get_github_token().context("GitHub authentication required for --pr")?;
    let body = fetch_pr_body(&token, &owner, &repo, number)
        .await
        .with_context(|| format!("Failed to fetch PR #{number}"))?;

    Ok(body)
}

/// Owner and repository name from the configured git remote.
fn github_repo_from_remote(config: &ReleaseConfig) -> Result<(String, String)> {
    let repo = Repository::open(&config.repo_root).context("Not a git repository")?;
    let remote = repo
        .find_remote(&config.git_remote)
        .with_context(|| format!("No '{}' remote found", config.git_remote))?;
    let url = remote.url().context("Remote has no URL")?;

    parse_github_remote(url).context("Could not parse GitHub remote URL")
}
