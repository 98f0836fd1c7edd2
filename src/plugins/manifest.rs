//! Plugin discovery from `package.json` manifests.

use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;
use tracing::debug;

use crate::error::ManifestError;

const MANIFEST_FILE: &str = "package.json";

/// The fields plugship reads from a plugin's `package.json`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PluginManifest {
    pub name: String,
    pub version: String,
    #[serde(default)]
    pub display_name: Option<String>,
}

/// A plugin directory together with its parsed manifest.
#[derive(Debug, Clone)]
pub struct Plugin {
    /// Directory name under the plugins root, e.g. `airtable`.
    pub dir_name: String,
    /// Directory relative to the repository root, e.g. `plugins/airtable`.
    pub relative_path: PathBuf,
    /// Absolute (or repo-root-joined) directory.
    pub path: PathBuf,
    pub manifest: PluginManifest,
    pub version: Version,
}

impl Plugin {
    /// Load the plugin `dir_name` from `<repo_root>/<plugins_dir>/<dir_name>`.
    pub fn load(repo_root: &Path, plugins_dir: &str, dir_name: &str) -> Result<Self, ManifestError> {
        let relative_path = Path::new(plugins_dir).join(dir_name);
        let path = repo_root.join(&relative_path);

        if !path.is_dir() {
            return Err(ManifestError::PluginNotFound(path.display().to_string()));
        }

        let manifest_path = path.join(MANIFEST_FILE);
        let content =
            std::fs::read_to_string(&manifest_path).map_err(|source| ManifestError::ReadFailed {
                path: manifest_path.display().to_string(),
                source,
            })?;

        let manifest: PluginManifest =
            serde_json::from_str(&content).map_err(|source| ManifestError::ParseFailed {
                path: manifest_path.display().to_string(),
                source,
            })?;

        let version =
            Version::parse(manifest.version.trim()).map_err(|source| ManifestError::InvalidVersion {
                path: manifest_path.display().to_string(),
                version: manifest.version.clone(),
                source,
            })?;

        debug!(plugin = %dir_name, version = %version, "Loaded plugin manifest");

        Ok(Self {
            dir_name: dir_name.to_string(),
            relative_path,
            path,
            manifest,
            version,
        })
    }

    /// Human-readable plugin name used for release tags and notifications.
    ///
    /// Falls back to the directory name when `displayName` is absent or blank.
    pub fn display_name(&self) -> &str {
        self.manifest
            .display_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(&self.dir_name)
    }

    /// Project path inside the repository, with forward slashes.
    pub fn project_path(&self) -> String {
        self.relative_path
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }
}

/// List every directory under `<repo_root>/<plugins_dir>` that holds a `package.json`.
pub fn list_plugins(repo_root: &Path, plugins_dir: &str) -> Result<Vec<String>, ManifestError> {
    let root = repo_root.join(plugins_dir);
    let entries = std::fs::read_dir(&root).map_err(|source| ManifestError::ReadFailed {
        path: root.display().to_string(),
        source,
    })?;

    let mut names: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().join(MANIFEST_FILE).is_file())
        .filter_map(|entry| entry.file_name().to_str().map(str::to_string))
        .collect();

    names.sort();
    Ok(names)
}
