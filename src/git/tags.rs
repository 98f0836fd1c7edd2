//! Release tag naming and lookup of the latest release of a plugin.

use std::cmp::Ordering;
use std::path::Path;
use std::sync::LazyLock;

use git2::Repository;
use regex_lite::Regex;
use semver::Version;
use tracing::{debug, warn};

use crate::error::GitError;

/// Separator between the plugin slug and its version in a release tag.
pub const VERSION_SEPARATOR: &str = "-v";

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Lower-case a display name and collapse whitespace runs into single hyphens.
///
/// `"Airtable  Extractor"` becomes `"airtable-extractor"`.
pub fn slugify(display_name: &str) -> String {
    WHITESPACE_RUN
        .replace_all(display_name.trim(), "-")
        .to_lowercase()
}

/// Prefix shared by every release tag of a plugin, e.g. `airtable-extractor-v`.
pub fn tag_prefix(display_name: &str) -> String {
    format!("{}{}", slugify(display_name), VERSION_SEPARATOR)
}

/// Full release tag for a plugin version, e.g. `airtable-extractor-v1.2.0`.
pub fn release_tag_name(display_name: &str, version: &Version) -> String {
    format!("{}{}", tag_prefix(display_name), version)
}

/// Source of tag names.
///
/// This abstraction allows the lookup logic to be tested without a repository.
#[cfg_attr(test, mockall::automock)]
pub trait TagRepository {
    /// All tag names starting with `prefix`, in no particular order.
    fn tags_with_prefix(&self, prefix: &str) -> Result<Vec<String>, GitError>;
}

/// [`TagRepository`] backed by a git2 repository.
pub struct Git2TagRepository<'r> {
    repo: &'r Repository,
}

impl<'r> Git2TagRepository<'r> {
    pub fn new(repo: &'r Repository) -> Self {
        Self { repo }
    }
}

impl TagRepository for Git2TagRepository<'_> {
    fn tags_with_prefix(&self, prefix: &str) -> Result<Vec<String>, GitError> {
        let pattern = format!("{prefix}*");
        let names = self
            .repo
            .tag_names(Some(&pattern))
            .map_err(GitError::TagListFailed)?;

        // fnmatch treats `[` and `?` specially, so confirm the literal prefix.
        Ok(names
            .iter()
            .flatten()
            .filter(|name| name.starts_with(prefix))
            .map(str::to_string)
            .collect())
    }
}

/// Compare two version strings the way `git tag --sort=v:refname` does.
///
/// Semver is used when both sides parse; otherwise digit runs are compared
/// numerically and everything else lexically.
pub fn compare_versions(a: &str, b: &str) -> Ordering {
    if let (Ok(va), Ok(vb)) = (Version::parse(a), Version::parse(b)) {
        return va.cmp(&vb);
    }

    let mut left = chunks(a);
    let mut right = chunks(b);

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(x), Some(y)) => {
                let ord = match (x.parse::<u64>(), y.parse::<u64>()) {
                    (Ok(nx), Ok(ny)) => nx.cmp(&ny),
                    _ => x.cmp(y),
                };
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

/// Split into alternating runs of ASCII digits and non-digits.
fn chunks(s: &str) -> impl Iterator<Item = &str> {
    let mut rest = s;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let digit = first.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digit)
            .unwrap_or(rest.len());
        let (chunk, tail) = rest.split_at(end);
        rest = tail;
        Some(chunk)
    })
}

/// Sort tags sharing `prefix` from highest to lowest version.
pub fn sort_tags_descending(prefix: &str, tags: &mut [String]) {
    tags.sort_by(|a, b| {
        let va = a.strip_prefix(prefix).unwrap_or(a);
        let vb = b.strip_prefix(prefix).unwrap_or(b);
        compare_versions(vb, va).then_with(|| b.cmp(a))
    });
}

/// Whether `tag` is `<prefix><version>` rather than a release of a plugin
/// whose slug merely extends this one (`foo-v` vs `foo-very-v0.1.0`).
fn is_release_of(prefix: &str, tag: &str) -> bool {
    tag.strip_prefix(prefix)
        .and_then(|version| version.chars().next())
        .is_some_and(|c| c.is_ascii_digit())
}

/// Latest release tag of a plugin from any tag source.
///
/// Listing failures are logged and treated as "no previous release".
pub fn latest_tag_in(tags: &dyn TagRepository, display_name: &str) -> Option<String> {
    let prefix = tag_prefix(display_name);

    let mut matches: Vec<String> = match tags.tags_with_prefix(&prefix) {
        Ok(matches) => matches
            .into_iter()
            .filter(|tag| is_release_of(&prefix, tag))
            .collect(),
        Err(e) => {
            warn!(prefix = %prefix, error = %e, "Could not list release tags, treating as first release");
            return None;
        }
    };

    if matches.is_empty() {
        debug!(prefix = %prefix, "No previous release tag found");
        return None;
    }

    sort_tags_descending(&prefix, &mut matches);
    let latest = matches.into_iter().next();
    debug!(tag = ?latest, "Resolved latest release tag");
    latest
}

/// Latest release tag of a plugin in the repository at `repo_root`.
///
/// Never fails: a missing or unreadable repository yields `None`, the same
/// as a plugin that has never been released.
pub fn latest_tag(display_name: &str, repo_root: &Path) -> Option<String> {
    let repo = match Repository::open(repo_root) {
        Ok(repo) => repo,
        Err(e) => {
            warn!(
                path = %repo_root.display(),
                error = %e,
                "Could not open repository for tag lookup, treating as first release"
            );
            return None;
        }
    };

    latest_tag_in(&Git2TagRepository::new(&repo), display_name)
}

/// Whether a tag with exactly this name exists.
pub fn tag_exists(repo: &Repository, tag_name: &str) -> bool {
    repo.refname_to_id(&format!("refs/tags/{tag_name}")).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Airtable"), "airtable");
        assert_eq!(slugify("CSV  Import\tTool"), "csv-import-tool");
        assert_eq!(slugify("  Padded Name "), "padded-name");
    }

    #[test]
    fn test_release_tag_name() {
        assert_eq!(
            release_tag_name("Airtable Extractor", &Version::new(1, 2, 3)),
            "airtable-extractor-v1.2.3"
        );
    }

    #[test]
    fn test_compare_versions_numeric_not_lexical() {
        assert_eq!(compare_versions("1.10.0", "1.9.0"), Ordering::Greater);
        assert_eq!(compare_versions("2", "10"), Ordering::Less);
        assert_eq!(compare_versions("1.0", "1.0.1"), Ordering::Less);
    }

    #[test]
    fn test_compare_versions_prerelease_ranks_below_release() {
        assert_eq!(compare_versions("1.0.0-beta.1", "1.0.0"), Ordering::Less);
    }

    #[test]
    fn test_sort_tags_descending() {
        let mut tags = vec![
            "foo-v1.9.0".to_string(),
            "foo-v1.10.0".to_string(),
            "foo-v0.3.2".to_string(),
        ];
        sort_tags_descending("foo-v", &mut tags);
        assert_eq!(tags, vec!["foo-v1.10.0", "foo-v1.9.0", "foo-v0.3.2"]);
    }

    #[test]
    fn test_latest_tag_in_skips_longer_slugs() {
        let mut mock = MockTagRepository::new();
        mock.expect_tags_with_prefix()
            .returning(|_| Ok(vec!["foo-very-v0.1.0".into(), "foo-v1.2.0".into(), "foo-v".into()]));

        assert_eq!(latest_tag_in(&mock, "Foo"), Some("foo-v1.2.0".to_string()));
    }

    #[test]
    fn test_latest_tag_in_only_longer_slugs_is_none() {
        let mut mock = MockTagRepository::new();
        mock.expect_tags_with_prefix()
            .returning(|_| Ok(vec!["foo-very-v0.1.0".into()]));

        assert_eq!(latest_tag_in(&mock, "Foo"), None);
    }

    #[test]
    fn test_latest_tag_in_uses_slug_prefix() {
        let mut mock = MockTagRepository::new();
        mock.expect_tags_with_prefix()
            .withf(|prefix| prefix == "csv-import-v")
            .returning(|_| Ok(vec!["csv-import-v2.0.0".into(), "csv-import-v10.0.0".into()]));

        assert_eq!(
            latest_tag_in(&mock, "CSV Import"),
            Some("csv-import-v10.0.0".to_string())
        );
    }

    #[test]
    fn test_latest_tag_in_no_matches() {
        let mut mock = MockTagRepository::new();
        mock.expect_tags_with_prefix().returning(|_| Ok(vec![]));

        assert_eq!(latest_tag_in(&mock, "airtable"), None);
    }

    #[test]
    fn test_latest_tag_in_swallows_errors() {
        let mut mock = MockTagRepository::new();
        mock.expect_tags_with_prefix().returning(|_| {
            Err(GitError::TagListFailed(git2::Error::from_str("boom")))
        });

        assert_eq!(latest_tag_in(&mock, "airtable"), None);
    }

    #[test]
    fn test_latest_tag_missing_repository() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(latest_tag("airtable", &dir.path().join("missing")), None);
    }
}
