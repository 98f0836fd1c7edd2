//! Error types for plugship modules using thiserror.

use thiserror::Error;

/// Errors from git operations.
#[derive(Error, Debug)]
pub enum GitError {
    #[error("Failed to open repository at {path}: {source}")]
    OpenRepository {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Failed to find reference '{0}': {1}")]
    ReferenceNotFound(String, #[source] git2::Error),

    #[error("Failed to list tags: {0}")]
    TagListFailed(#[source] git2::Error),

    #[error("Failed to walk commit history: {0}")]
    RevwalkError(#[source] git2::Error),

    #[error("Failed to compute diff for {path}: {source}")]
    DiffFailed {
        path: String,
        #[source]
        source: git2::Error,
    },

    #[error("Bare repository not supported")]
    BareRepository,

    #[error("git {operation} failed: {stderr}")]
    CommandFailed { operation: String, stderr: String },

    #[error("Failed to run git {operation}: {source}")]
    SpawnFailed {
        operation: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors from GitHub API operations.
#[derive(Error, Debug)]
pub enum GitHubError {
    #[error(
        "GitHub authentication failed: no valid auth found. Run 'gh auth login' or set GITHUB_TOKEN environment variable"
    )]
    AuthenticationFailed,

    #[error("Failed to fetch pull request: {0}")]
    FetchPullRequest(#[source] Box<octocrab::Error>),

    #[error("Rate limited by GitHub API. Resets at: {reset_time}")]
    RateLimited { reset_time: String },

    #[error("Pull request #{number} not found in {owner}/{repo}")]
    PullRequestNotFound {
        owner: String,
        repo: String,
        number: u64,
    },

    #[error("Failed to parse repository URL")]
    InvalidRepositoryUrl,
}

/// Errors from Claude CLI operations.
#[derive(Error, Debug)]
pub enum ClaudeError {
    #[error("Claude Code CLI not found. Install with: npm install -g @anthropic-ai/claude-code")]
    NotInstalled,

    #[error("Claude Code CLI failed to execute: {0}")]
    ExecutionFailed(String),

    #[error("Failed to spawn Claude process: {0}")]
    SpawnFailed(#[source] std::io::Error),

    #[error("Claude returned an empty changelog")]
    EmptyResponse,

    #[error("Claude process timed out after {0} seconds")]
    Timeout(u64),

    #[error("Claude CLI exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("All retry attempts failed: {0}")]
    RetriesExhausted(#[source] Box<ClaudeError>),
}

/// Errors from configuration loading and validation.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("Invalid URL in {var}: {value}")]
    InvalidUrl { var: &'static str, value: String },

    #[error("{var} must be set together with {requires}")]
    IncompleteCredentials {
        var: &'static str,
        requires: &'static str,
    },

    #[error("Invalid GITHUB_REPOSITORY '{0}': expected owner/repo")]
    InvalidRepository(String),

    #[error("Repository path does not exist: {0}")]
    RepoNotFound(String),

    #[error("{0} must not be empty")]
    Empty(&'static str),
}

/// Errors from plugin manifest discovery.
#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Plugin directory not found: {0}")]
    PluginNotFound(String),

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid version '{version}' in {path}: {source}")]
    InvalidVersion {
        path: String,
        version: String,
        #[source]
        source: semver::Error,
    },
}

/// Errors from building and packing a plugin artifact.
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("npm not found in PATH")]
    NpmNotInstalled,

    #[error("Failed to run {command}: {source}")]
    SpawnFailed {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{command} exited with code {code}: {stderr}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error("Could not read artifact name from npm pack output: {0}")]
    InvalidPackOutput(String),

    #[error("Artifact {0} was not produced")]
    ArtifactMissing(String),
}

/// Errors from the marketplace submission API.
#[derive(Error, Debug)]
pub enum MarketplaceError {
    #[error("Failed to read artifact {path}: {source}")]
    ArtifactRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Marketplace request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Version {version} of {plugin} already exists in the marketplace")]
    VersionExists { plugin: String, version: String },

    #[error("Marketplace rejected submission with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Marketplace returned an unreadable response: {0}")]
    InvalidResponse(String),
}

/// Errors from chat notifications.
#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("Webhook request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("Webhook returned status {status}: {body}")]
    Rejected { status: u16, body: String },
}

/// Errors from the release pipeline.
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Manifest(#[from] ManifestError),

    #[error(transparent)]
    Git(#[from] GitError),

    #[error(transparent)]
    GitHub(#[from] GitHubError),

    #[error(transparent)]
    Build(#[from] BuildError),

    #[error(transparent)]
    Marketplace(#[from] MarketplaceError),

    #[error("Release tag {0} already exists. Bump the version in package.json first.")]
    TagAlreadyExists(String),

    #[error("Release cancelled by user")]
    Cancelled,
}
