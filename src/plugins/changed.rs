//! Map a CI "changed files" list to the plugins it touches.

use std::collections::BTreeSet;

/// Directory that holds one sub-directory per plugin.
pub const DEFAULT_PLUGINS_DIR: &str = "plugins";

/// Names of the plugins under `plugins/` touched by a changed-files list.
///
/// See [`parse_changed_projects`] for the parsing rules.
pub fn parse_changed_plugins(raw: &str) -> Vec<String> {
    parse_changed_projects(raw, DEFAULT_PLUGINS_DIR)
}

/// Names of the projects under `root` touched by a changed-files list.
///
/// `raw` is a whitespace-separated list of repository-relative paths (spaces,
/// tabs and newlines are all delimiters). A path contributes the directory
/// name directly under `root` only when it points inside that directory:
/// `plugins/airtable/src/index.ts` yields `airtable`, `plugins/README.md`
/// yields nothing. Result is deduplicated and sorted.
pub fn parse_changed_projects(raw: &str, root: &str) -> Vec<String> {
    let root = root.trim_end_matches('/');

    let names: BTreeSet<&str> = raw
        .split_whitespace()
        .filter_map(|path| project_name(path, root))
        .collect();

    names.into_iter().map(str::to_string).collect()
}

fn project_name<'a>(path: &'a str, root: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(root)?.strip_prefix('/')?;
    let (name, remainder) = rest.split_once('/')?;

    if name.is_empty() || remainder.is_empty() {
        return None;
    }

    Some(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_name_requires_subdirectory() {
        assert_eq!(project_name("plugins/airtable/src/x.ts", "plugins"), Some("airtable"));
        assert_eq!(project_name("plugins/README.md", "plugins"), None);
        assert_eq!(project_name("plugins/airtable/", "plugins"), None);
    }

    #[test]
    fn test_project_name_rejects_similar_prefix() {
        assert_eq!(project_name("plugins-old/airtable/a.ts", "plugins"), None);
        assert_eq!(project_name("other/plugins/airtable/a.ts", "plugins"), None);
    }

    #[test]
    fn test_project_name_rejects_empty_segment() {
        assert_eq!(project_name("plugins//a.ts", "plugins"), None);
    }

    #[test]
    fn test_custom_root_with_trailing_slash() {
        let names = parse_changed_projects("extensions/foo/a.ts extensions/bar/b.ts", "extensions/");
        assert_eq!(names, vec!["bar", "foo"]);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let names = parse_changed_plugins("plugins/Foo/a.ts plugins/foo/b.ts");
        assert_eq!(names, vec!["Foo", "foo"]);
    }
}
