//! Reading and writing per-package `CHANGELOG.md` files
//!
//! Entries are headed `## [<version>] - <YYYY-MM-DD>` and are kept newest first.

use chrono::NaiveDate;

const DEFAULT_TITLE: &str = "# Changelog";

/// Heading line for a release entry
pub fn entry_heading(version: &str, date: NaiveDate) -> String {
    format!("## [{}] - {}", version, date.format("%Y-%m-%d"))
}

/// Insert a new entry above the existing ones, below any title preamble.
///
/// An empty file gets a `# Changelog` title first.
pub fn prepend_entry(existing: &str, version: &str, date: NaiveDate, body: &str) -> String {
    let mut entry = entry_heading(version, date);
    entry.push_str("\n\n");
    let body = body.trim();
    if !body.is_empty() {
        entry.push_str(body);
        entry.push_str("\n\n");
    }

    if existing.trim().is_empty() {
        return format!("{}\n\n{}", DEFAULT_TITLE, entry.trim_end()) + "\n";
    }

    match first_entry_offset(existing) {
        Some(offset) => {
            let (preamble, rest) = existing.split_at(offset);
            format!("{}{}{}", preamble, entry, rest)
        }
        None => {
            let mut out = existing.trim_end().to_string();
            out.push_str("\n\n");
            out.push_str(entry.trim_end());
            out.push('\n');
            out
        }
    }
}

/// Body of the entry for `version`, without its heading
pub fn extract_section(content: &str, version: &str) -> Option<String> {
    let mut lines = content.lines();
    lines.find(|line| heading_version(line) == Some(version))?;

    let body: Vec<&str> = lines.take_while(|line| !line.starts_with("## ")).collect();
    let body = body.join("\n").trim().to_string();
    Some(body)
}

/// Version named by a `## ` heading, with or without brackets
fn heading_version(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("## ")?.trim();
    let token = rest.split_whitespace().next()?;
    let token = token
        .strip_prefix('[')
        .and_then(|t| t.strip_suffix(']'))
        .unwrap_or(token);
    Some(token.strip_prefix('v').unwrap_or(token))
}

fn first_entry_offset(content: &str) -> Option<usize> {
    let mut offset = 0;
    for line in content.split_inclusive('\n') {
        if line.starts_with("## ") {
            return Some(offset);
        }
        offset += line.len();
    }
    None
}
