//! Release notes: PR body extraction and resolution.

pub mod resolve;
pub mod section;

pub use resolve::{ChangelogRequest, ChangelogSource, ResolvedChangelog, resolve_changelog};
pub use section::extract_changelog;
