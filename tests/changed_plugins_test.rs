//! Integration tests for mapping changed files to plugin names.

use plugship::{parse_changed_plugins, parse_changed_projects};

fn names(raw: &str) -> Vec<String> {
    parse_changed_plugins(raw).into_iter().collect()
}

#[test]
fn test_deduplicates_and_sorts() {
    let raw = "plugins/airtable/src/a.ts plugins/airtable/src/b.ts plugins/notion/index.ts";
    assert_eq!(names(raw), vec!["airtable", "notion"]);
}

#[test]
fn test_ignores_files_outside_plugins_dir() {
    assert_eq!(names("README.md .github/workflows/ci.yml"), Vec::<String>::new());
}

#[test]
fn test_file_directly_in_plugins_dir_is_ignored() {
    assert_eq!(names("plugins/README.md"), Vec::<String>::new());
}

#[test]
fn test_empty_and_whitespace_input() {
    assert!(parse_changed_plugins("").is_empty());
    assert!(parse_changed_plugins("  \n\t  ").is_empty());
}

#[test]
fn test_mixed_separators() {
    let raw = "plugins/b/x.ts\nplugins/a/y.ts\tplugins/c/z.ts   plugins/a/w.ts\r\n";
    assert_eq!(names(raw), vec!["a", "b", "c"]);
}

#[test]
fn test_order_of_input_does_not_matter() {
    let forward = "plugins/zeta/a plugins/alpha/b plugins/mid/c";
    let backward = "plugins/mid/c plugins/alpha/b plugins/zeta/a";
    assert_eq!(names(forward), names(backward));
}

#[test]
fn test_nested_paths_use_first_segment() {
    let raw = "plugins/airtable/src/deep/nested/file.ts";
    assert_eq!(names(raw), vec!["airtable"]);
}

#[test]
fn test_similar_prefix_directory_is_not_plugins() {
    assert_eq!(names("plugins-legacy/old/file.ts pluginsx/a/b"), Vec::<String>::new());
}

#[test]
fn test_custom_plugins_root() {
    let raw = "packages/ui/index.ts plugins/airtable/a.ts";
    let found: Vec<String> = parse_changed_projects(raw, "packages").into_iter().collect();
    assert_eq!(found, vec!["ui"]);
}

#[test]
fn test_realistic_git_diff_name_only_output() {
    let raw = "\
.github/workflows/release.yml
package-lock.json
plugins/airtable/package.json
plugins/airtable/src/sync.ts
plugins/google-sheets/src/auth.ts
";
    assert_eq!(names(raw), vec!["airtable", "google-sheets"]);
}
