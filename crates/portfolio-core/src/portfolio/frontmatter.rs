//! Frontmatter handling for element files.
//!
//! Element files carry a leading `---`-delimited metadata block. Two readers
//! are provided: [`extract_frontmatter`] splits the block from the body for a
//! full YAML parser, and [`scan_frontmatter`] is a narrow `key: value`
//! scanner used on remote content, where a malformed block must never fail
//! the surrounding fetch.

use std::collections::BTreeMap;

/// Split a file into its frontmatter block and body.
///
/// Content must start with `---`, and a closing `\n---` line separates the
/// block from the body. Returns `None` if either delimiter is missing.
pub fn extract_frontmatter(content: &str) -> Option<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let after_open = content.strip_prefix("---")?;
    let after_open = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))?;

    // An empty block closes immediately.
    if let Some(rest) = after_open.strip_prefix("---") {
        return Some(("", rest.trim_start_matches(['\r', '\n'])));
    }

    let closing_pos = after_open.find("\n---")?;
    let block = &after_open[..closing_pos];
    let remainder = &after_open[closing_pos + 4..];
    let body = remainder.trim_start_matches(['\r', '\n']);

    Some((block.trim_end_matches('\r'), body))
}

/// Simple top-level fields read from a frontmatter block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScannedFrontmatter {
    fields: BTreeMap<String, String>,
}

impl ScannedFrontmatter {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.get("name")
    }

    pub fn description(&self) -> Option<&str> {
        self.get("description")
    }

    pub fn version(&self) -> Option<&str> {
        self.get("version")
    }

    pub fn author(&self) -> Option<&str> {
        self.get("author")
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Scan the leading frontmatter block for simple `key: value` lines.
///
/// Nested maps, list items, comments, and block scalars are skipped. The
/// first line that is not a recognizable field ends the scan, so a malformed
/// block yields the fields that preceded it. A missing closing delimiter is
/// tolerated the same way. The first occurrence of a key wins.
pub fn scan_frontmatter(content: &str) -> ScannedFrontmatter {
    let mut scanned = ScannedFrontmatter::default();
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    let mut lines = content.lines();
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return scanned,
    }

    for line in lines {
        let trimmed = line.trim();
        if line.trim_end() == "---" {
            break;
        }
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        // Nested content and list items belong to a previous key.
        if line.starts_with([' ', '\t']) || trimmed.starts_with("- ") || trimmed == "-" {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            break;
        };
        let key = key.trim();
        if key.is_empty()
            || !key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            break;
        }

        let value = unquote(value.trim());
        if value.is_empty() || value == "|" || value == ">" || value == "|-" || value == ">-" {
            continue;
        }
        scanned
            .fields
            .entry(key.to_string())
            .or_insert_with(|| value.to_string());
    }

    scanned
}

fn unquote(value: &str) -> &str {
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return &value[1..value.len() - 1];
        }
    }
    value
}

/// Derive an element name from a file name (`"creative-writer.md"` ->
/// `"creative-writer"`).
pub fn name_from_filename(filename: &str) -> &str {
    filename
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .filter(|stem| !stem.is_empty())
        .unwrap_or(filename)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_splits_block_and_body() {
        let content = "---\nname: writer\nversion: 1.0.0\n---\n\n# Writer\n";
        let (block, body) = extract_frontmatter(content).unwrap();
        assert_eq!(block, "name: writer\nversion: 1.0.0");
        assert_eq!(body, "# Writer\n");
    }

    #[test]
    fn test_extract_handles_crlf_and_empty_block() {
        let (block, body) = extract_frontmatter("---\r\nname: a\r\n---\r\nbody").unwrap();
        assert_eq!(block, "name: a");
        assert_eq!(body, "body");

        let (block, body) = extract_frontmatter("---\n---\nbody").unwrap();
        assert_eq!(block, "");
        assert_eq!(body, "body");
    }

    #[test]
    fn test_extract_requires_both_delimiters() {
        assert!(extract_frontmatter("# no frontmatter").is_none());
        assert!(extract_frontmatter("---\nname: a\nno closing").is_none());
    }

    #[test]
    fn test_scan_reads_simple_fields() {
        let content = r#"---
name: "Creative Writer"
description: Helps with fiction
version: '2.1.0'
author: octocat
tags:
  - writing
  - fiction
---
Body text
"#;
        let fm = scan_frontmatter(content);
        assert_eq!(fm.name(), Some("Creative Writer"));
        assert_eq!(fm.description(), Some("Helps with fiction"));
        assert_eq!(fm.version(), Some("2.1.0"));
        assert_eq!(fm.author(), Some("octocat"));
        // `tags:` has no inline value and its items are skipped.
        assert_eq!(fm.get("tags"), None);
    }

    #[test]
    fn test_scan_keeps_prefix_of_malformed_block() {
        let content = "---\nname: reviewer\nversion: 1.2.0\nthis line is garbage\nauthor: nobody\n---\n";
        let fm = scan_frontmatter(content);
        assert_eq!(fm.name(), Some("reviewer"));
        assert_eq!(fm.version(), Some("1.2.0"));
        assert_eq!(fm.author(), None);
    }

    #[test]
    fn test_scan_tolerates_missing_closing_delimiter() {
        let fm = scan_frontmatter("---\nname: draft\ndescription: unfinished");
        assert_eq!(fm.name(), Some("draft"));
        assert_eq!(fm.description(), Some("unfinished"));
    }

    #[test]
    fn test_scan_ignores_content_without_leading_block() {
        assert!(scan_frontmatter("name: not frontmatter\n").is_empty());
        assert!(scan_frontmatter("").is_empty());
    }

    #[test]
    fn test_scan_first_occurrence_wins_and_values_keep_colons() {
        let fm = scan_frontmatter("---\nname: a\nname: b\ndescription: ratio 1:2\n---\n");
        assert_eq!(fm.name(), Some("a"));
        assert_eq!(fm.description(), Some("ratio 1:2"));
    }

    #[test]
    fn test_name_from_filename_strips_extension() {
        assert_eq!(name_from_filename("creative-writer.md"), "creative-writer");
        assert_eq!(name_from_filename("archive.tar.md"), "archive.tar");
        assert_eq!(name_from_filename("README"), "README");
        assert_eq!(name_from_filename(".md"), ".md");
    }
}
