//! Extract the `### Changelog` section from a pull request description.

use std::sync::LazyLock;

use regex_lite::Regex;

/// A markdown ATX heading: one or more `#` followed by whitespace.
static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^#+\s+(.*)$").expect("heading pattern is valid")
});

/// Placeholder bullet left behind by the PR template when nothing was filled in.
const PLACEHOLDER: &str = "-";

/// Returns the text of a heading line, or `None` if the line is not a heading.
fn heading_text(line: &str) -> Option<&str> {
    HEADING
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

fn is_changelog_heading(line: &str) -> bool {
    heading_text(line).is_some_and(|text| text.eq_ignore_ascii_case("changelog"))
}

/// Pull the release notes out of a PR body.
///
/// Looks for a heading whose text is `changelog` (any case, any heading
/// level) and returns everything up to the next heading or the end of the
/// body, trimmed. Returns `None` when the body is absent, when there is no
/// changelog heading, or when the section is empty or only holds the
/// template's `-` placeholder.
pub fn extract_changelog(body: Option<&str>) -> Option<String> {
    let body = body.filter(|b| !b.is_empty())?;

    let mut lines = body.lines();
    lines.by_ref().find(|line| is_changelog_heading(line))?;

    let section: Vec<&str> = lines
        .take_while(|line| heading_text(line).is_none())
        .collect();

    let text = section.join("\n");
    let text = text.trim();

    if text.is_empty() || text == PLACEHOLDER {
        return None;
    }

    Some(text.to_string())
}
