//! Integration tests for release tag lookup against real repositories.

mod common;

use common::TestRepo;
use plugship::git::tags::tag_exists;
use plugship::git::{Git2TagRepository, TagRepository, release_tag_name};
use plugship::latest_tag;
use semver::Version;

#[test]
fn test_latest_tag_uses_version_order_not_lexical() {
    let repo = TestRepo::new();
    let first = repo.add_plugin("airtable", "Airtable", "1.9.0");
    let second = repo.commit_files(&[("plugins/airtable/src/index.ts", "v2")], "fix");

    repo.tag_lightweight("airtable-v1.9.0", first);
    repo.tag_lightweight("airtable-v1.10.0", second);

    assert_eq!(
        latest_tag("Airtable", repo.path()),
        Some("airtable-v1.10.0".to_string())
    );
}

#[test]
fn test_latest_tag_ignores_other_plugins() {
    let repo = TestRepo::new();
    let oid = repo.add_plugin("airtable", "Airtable", "1.0.0");

    repo.tag_lightweight("airtable-v1.0.0", oid);
    repo.tag_lightweight("notion-v9.9.9", oid);
    repo.tag_lightweight("airtable-sync-v5.0.0", oid);

    assert_eq!(
        latest_tag("Airtable", repo.path()),
        Some("airtable-v1.0.0".to_string())
    );
}

#[test]
fn test_latest_tag_ignores_plugin_with_extended_slug() {
    let repo = TestRepo::new();
    let oid = repo.add_plugin("foo", "Foo", "1.2.0");
    repo.tag_lightweight("foo-v1.2.0", oid);
    repo.tag_lightweight("foo-very-v0.1.0", oid);

    assert_eq!(latest_tag("Foo", repo.path()), Some("foo-v1.2.0".to_string()));
    assert_eq!(
        latest_tag("Foo Very", repo.path()),
        Some("foo-very-v0.1.0".to_string())
    );
}

#[test]
fn test_latest_tag_matches_annotated_tags() {
    let repo = TestRepo::new();
    let oid = repo.add_plugin("airtable", "Airtable", "2.0.0");
    repo.tag_annotated("airtable-v2.0.0", oid, "Release tag");

    assert_eq!(
        latest_tag("Airtable", repo.path()),
        Some("airtable-v2.0.0".to_string())
    );
}

#[test]
fn test_latest_tag_slugifies_display_name() {
    let repo = TestRepo::new();
    let oid = repo.add_plugin("sheets", "Google Sheets", "0.3.0");
    repo.tag_lightweight("google-sheets-v0.2.0", oid);
    repo.tag_lightweight("google-sheets-v0.3.0", oid);

    assert_eq!(
        latest_tag("Google Sheets", repo.path()),
        Some("google-sheets-v0.3.0".to_string())
    );
}

#[test]
fn test_latest_tag_none_without_tags() {
    let repo = TestRepo::new();
    repo.add_plugin("airtable", "Airtable", "1.0.0");

    assert_eq!(latest_tag("Airtable", repo.path()), None);
}

#[test]
fn test_latest_tag_none_outside_repository() {
    let dir = tempfile::tempdir().unwrap();
    assert_eq!(latest_tag("Airtable", dir.path()), None);
}

#[test]
fn test_prerelease_sorts_below_release() {
    let repo = TestRepo::new();
    let oid = repo.add_plugin("airtable", "Airtable", "2.0.0");
    repo.tag_lightweight("airtable-v2.0.0-beta.1", oid);
    repo.tag_lightweight("airtable-v2.0.0", oid);
    repo.tag_lightweight("airtable-v1.99.0", oid);

    assert_eq!(
        latest_tag("Airtable", repo.path()),
        Some("airtable-v2.0.0".to_string())
    );
}

#[test]
fn test_git2_repository_lists_only_prefixed_tags() {
    let repo = TestRepo::new();
    let oid = repo.add_plugin("airtable", "Airtable", "1.0.0");
    repo.tag_lightweight("airtable-v1.0.0", oid);
    repo.tag_lightweight("v1.0.0", oid);

    let tags = Git2TagRepository::new(&repo.repo)
        .tags_with_prefix("airtable-v")
        .unwrap();

    assert_eq!(tags, vec!["airtable-v1.0.0".to_string()]);
}

#[test]
fn test_tag_exists_for_release_tag_name() {
    let repo = TestRepo::new();
    let oid = repo.add_plugin("airtable", "Airtable", "1.2.3");
    let tag = release_tag_name("Airtable", &Version::new(1, 2, 3));
    repo.tag_lightweight(&tag, oid);

    assert_eq!(tag, "airtable-v1.2.3");
    assert!(tag_exists(&repo.repo, &tag));
    assert!(!tag_exists(&repo.repo, "airtable-v1.2.4"));
}
