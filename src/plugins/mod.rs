//! Plugin discovery and change detection.

pub mod changed;
pub mod manifest;

pub use changed::{DEFAULT_PLUGINS_DIR, parse_changed_plugins, parse_changed_projects};
pub use manifest::{Plugin, PluginManifest, list_plugins};
