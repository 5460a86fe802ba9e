//! Conventional Commits parser
//!
//! Parses commits following the Conventional Commits specification:
//! https://www.conventionalcommits.org/
//!
//! Messages that do not follow the grammar, or that use a type outside the
//! recognized set, are kept as `chore` records carrying the whole raw message.

use std::str::FromStr;
use std::sync::LazyLock;

use liftoff_core::types::{CommitType, ConventionalCommit};
use regex::Regex;
use tracing::trace;

/// Regex for the subject line of a conventional commit
static CONVENTIONAL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<type>[a-zA-Z]+)(?:\((?P<scope>[^)]+)\))?(?P<breaking>!)?: (?P<description>.+)$",
    )
    .expect("Invalid regex")
});

/// Regex for a breaking-change footer
static BREAKING_FOOTER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^BREAKING[ -]CHANGE: .+$").expect("Invalid regex"));

/// Parser for Conventional Commits format
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionalParser;

impl ConventionalParser {
    /// Create a new parser
    pub fn new() -> Self {
        Self
    }

    /// Classify a commit message. Never fails.
    pub fn parse(&self, message: &str, source_ref: &str) -> ConventionalCommit {
        match self.parse_subject(message) {
            Some((commit_type, scope, breaking_marker, description)) => {
                let breaking = breaking_marker || has_breaking_footer(message);
                ConventionalCommit {
                    commit_type,
                    scope,
                    breaking,
                    message: description,
                    source_ref: source_ref.to_string(),
                }
            }
            None => {
                trace!(source_ref, "commit is not conventional, recording as chore");
                ConventionalCommit {
                    commit_type: CommitType::Chore,
                    scope: None,
                    breaking: false,
                    message: message.to_string(),
                    source_ref: source_ref.to_string(),
                }
            }
        }
    }

    /// Whether the subject line matches the grammar with a recognized type
    pub fn is_conventional(&self, message: &str) -> bool {
        self.parse_subject(message).is_some()
    }

    fn parse_subject(
        &self,
        message: &str,
    ) -> Option<(CommitType, Option<String>, bool, String)> {
        let subject = message.lines().next()?.trim_end();
        let caps = CONVENTIONAL_REGEX.captures(subject)?;

        let commit_type = CommitType::from_str(caps.name("type")?.as_str()).ok()?;
        let scope = caps.name("scope").map(|m| m.as_str().to_string());
        let breaking = caps.name("breaking").is_some();
        let description = caps.name("description")?.as_str().to_string();

        Some((commit_type, scope, breaking, description))
    }
}

fn has_breaking_footer(message: &str) -> bool {
    message
        .lines()
        .skip(1)
        .any(|line| BREAKING_FOOTER_REGEX.is_match(line.trim_end()))
}
