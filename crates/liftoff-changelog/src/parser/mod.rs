//! Commit parsing

mod conventional;

pub use conventional::ConventionalParser;

use liftoff_core::types::ConventionalCommit;

/// Classify a single commit message
pub fn parse_commit(message: &str, source_ref: &str) -> ConventionalCommit {
    ConventionalParser::new().parse(message, source_ref)
}

/// Split a squash-merge message into the commits it summarizes.
///
/// Squash merges list the original commits as bullet lines (`* feat: x`).
/// When at least one bullet parses as a conventional commit, the bullets
/// that do are returned in order and the summary subject is dropped.
/// Otherwise the message is returned unchanged as a single element.
pub fn split_squashed(message: &str) -> Vec<String> {
    let parser = ConventionalParser::new();
    let bullets: Vec<String> = message
        .lines()
        .skip(1)
        .filter_map(|line| {
            let line = line.trim();
            line.strip_prefix("* ")
                .or_else(|| line.strip_prefix("- "))
                .map(str::trim)
        })
        .filter(|item| parser.is_conventional(item))
        .map(str::to_string)
        .collect();

    if bullets.is_empty() {
        vec![message.to_string()]
    } else {
        bullets
    }
}

/// Classify a commit, expanding squash merges into their listed commits.
///
/// Every resulting record keeps the squash commit as its source.
pub fn classify(message: &str, source_ref: &str) -> Vec<ConventionalCommit> {
    split_squashed(message)
        .iter()
        .map(|m| parse_commit(m, source_ref))
        .collect()
}
