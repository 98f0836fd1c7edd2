//! Plugin artifact building with npm.

use std::path::{Path, PathBuf};
use std::process::Command;

use serde::Deserialize;
use tracing::info;

use crate::error::BuildError;
use crate::plugins::Plugin;

/// Produces an uploadable artifact from a plugin directory.
pub trait ArtifactBuilder {
    fn build(&self, plugin: &Plugin) -> Result<PathBuf, BuildError>;
}

/// Runs `npm run build` then `npm pack` in the plugin directory.
pub struct NpmArtifactBuilder {
    pub run_build_script: bool,
}

/// One entry of `npm pack --json` output.
#[derive(Debug, Deserialize)]
struct PackEntry {
    filename: String,
}

impl ArtifactBuilder for NpmArtifactBuilder {
    fn build(&self, plugin: &Plugin) -> Result<PathBuf, BuildError> {
        if which::which("npm").is_err() {
            return Err(BuildError::NpmNotInstalled);
        }

        if self.run_build_script {
            info!(plugin = %plugin.dir_name, "Running npm build");
            run_npm(&plugin.path, &["run", "build"])?;
        }

        let stdout = run_npm(&plugin.path, &["pack", "--json"])?;
        let filename = parse_pack_output(&stdout)?;
        let artifact = plugin.path.join(&filename);

        if !artifact.is_file() {
            return Err(BuildError::ArtifactMissing(artifact.display().to_string()));
        }

        info!(plugin = %plugin.dir_name, artifact = %artifact.display(), "Packed artifact");
        Ok(artifact)
    }
}

/// Extract the tarball name from `npm pack --json`.
///
/// Lifecycle scripts may print to stdout before the JSON array, so parsing
/// starts at the first line that opens the array.
fn parse_pack_output(stdout: &str) -> Result<String, BuildError> {
    let start = stdout
        .lines()
        .position(|line| line.trim_start().starts_with('['))
        .ok_or_else(|| BuildError::InvalidPackOutput(stdout.trim().to_string()))?;
    let json = stdout.lines().skip(start).collect::<Vec<_>>().join("\n");

    let entries: Vec<PackEntry> = serde_json::from_str(&json)
        .map_err(|e| BuildError::InvalidPackOutput(format!("{}: {}", e, json.trim())))?;

    entries
        .into_iter()
        .next()
        .map(|entry| entry.filename)
        .ok_or_else(|| BuildError::InvalidPackOutput("empty pack result".to_string()))
}

fn run_npm(dir: &Path, args: &[&str]) -> Result<String, BuildError> {
    let command = format!("npm {}", args.join(" "));
    let output = Command::new("npm")
        .args(args)
        .current_dir(dir)
        .output()
        .map_err(|source| BuildError::SpawnFailed {
            command: command.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(BuildError::CommandFailed {
            command,
            code: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
