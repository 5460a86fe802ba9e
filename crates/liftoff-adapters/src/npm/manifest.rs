//! npm package.json handling

use std::sync::LazyLock;

use liftoff_core::error::{AdapterError, Result};
use regex::Regex;
use serde::Deserialize;

/// Regex for a `"version": "..."` member
static VERSION_FIELD_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?P<prefix>"version"\s*:\s*")(?P<version>[^"]*)(?P<suffix>")"#)
        .expect("Invalid regex")
});

/// package.json fields liftoff reads
#[derive(Debug, Clone, Deserialize)]
pub struct PackageJson {
    /// Package name
    #[serde(default)]
    pub name: Option<String>,

    /// Package version
    #[serde(default)]
    pub version: Option<String>,
}

impl PackageJson {
    /// Parse package.json content
    pub fn parse(content: &str) -> Result<Self> {
        serde_json::from_str(content)
            .map_err(|e| AdapterError::ManifestParseError(e.to_string()).into())
    }

    /// Replace the top-level version in place.
    ///
    /// Only the characters of the version string change; key order,
    /// indentation, and trailing newline are preserved.
    pub fn update_version(content: &str, version: &str) -> Result<String> {
        let current = Self::parse(content)?.version.ok_or_else(|| {
            AdapterError::ManifestUpdateError("package.json has no version field".to_string())
        })?;

        // Nested objects may carry their own "version"; only a member of the
        // root object counts.
        let found = VERSION_FIELD_REGEX
            .captures_iter(content)
            .filter_map(|caps| caps.get(0).zip(caps.name("version")))
            .find(|(member, value)| {
                value.as_str() == current && nesting_at(content, member.start()) == Some(1)
            })
            .map(|(_, value)| value)
            .ok_or_else(|| {
                AdapterError::ManifestUpdateError(
                    "could not locate version field in package.json".to_string(),
                )
            })?;

        let mut out = String::with_capacity(content.len() + version.len());
        out.push_str(&content[..found.start()]);
        out.push_str(version);
        out.push_str(&content[found.end()..]);
        Ok(out)
    }
}

/// Object/array nesting depth at byte `offset`, `None` inside a string
fn nesting_at(content: &str, offset: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for &byte in &content.as_bytes()[..offset] {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => depth += 1,
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }

    (!in_string).then_some(depth)
}
