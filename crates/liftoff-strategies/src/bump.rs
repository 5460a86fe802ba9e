//! Folding classified commits into a single bump decision

use liftoff_core::types::{CommitType, ConventionalCommit};
use tracing::debug;

use crate::types::BumpType;

/// Bump implied by a commit type alone
pub fn bump_for_type(commit_type: CommitType) -> BumpType {
    match commit_type {
        CommitType::Feat => BumpType::Minor,
        CommitType::Fix | CommitType::Perf | CommitType::Refactor | CommitType::Revert => {
            BumpType::Patch
        }
        CommitType::Docs
        | CommitType::Style
        | CommitType::Test
        | CommitType::Chore
        | CommitType::Ci
        | CommitType::Build => BumpType::None,
    }
}

/// Highest bump across `commits`; any breaking commit yields `Major` at once
pub fn determine_bump(commits: &[ConventionalCommit]) -> BumpType {
    let mut bump = BumpType::None;

    for commit in commits {
        if commit.breaking {
            debug!(source_ref = %commit.source_ref, "breaking commit forces major bump");
            return BumpType::Major;
        }
        bump = bump.max(bump_for_type(commit.commit_type));
    }

    bump
}

/// Whether a single commit would trigger a release on its own
pub fn is_release_worthy(commit: &ConventionalCommit) -> bool {
    commit.breaking || bump_for_type(commit.commit_type).is_bump()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn commit(commit_type: CommitType, breaking: bool) -> ConventionalCommit {
        ConventionalCommit {
            commit_type,
            scope: None,
            breaking,
            message: "x".to_string(),
            source_ref: "abc".to_string(),
        }
    }

    #[test]
    fn test_empty_is_none() {
        assert_eq!(determine_bump(&[]), BumpType::None);
    }

    #[test]
    fn test_type_mapping() {
        assert_eq!(determine_bump(&[commit(CommitType::Feat, false)]), BumpType::Minor);
        for t in [CommitType::Fix, CommitType::Perf, CommitType::Refactor, CommitType::Revert] {
            assert_eq!(determine_bump(&[commit(t, false)]), BumpType::Patch);
        }
        for t in [
            CommitType::Docs,
            CommitType::Style,
            CommitType::Test,
            CommitType::Chore,
            CommitType::Ci,
            CommitType::Build,
        ] {
            assert_eq!(determine_bump(&[commit(t, false)]), BumpType::None);
        }
    }

    #[test]
    fn test_breaking_anywhere_is_major() {
        let commits = vec![
            commit(CommitType::Fix, false),
            commit(CommitType::Docs, true),
            commit(CommitType::Feat, false),
        ];
        assert_eq!(determine_bump(&commits), BumpType::Major);
    }

    #[test]
    fn test_bump_is_monotone_as_commits_are_added() {
        let sequence = [
            commit(CommitType::Chore, false),
            commit(CommitType::Fix, false),
            commit(CommitType::Docs, false),
            commit(CommitType::Feat, false),
            commit(CommitType::Fix, false),
            commit(CommitType::Refactor, true),
            commit(CommitType::Fix, false),
        ];

        let mut previous = BumpType::None;
        for n in 0..=sequence.len() {
            let current = determine_bump(&sequence[..n]);
            assert!(current >= previous, "bump decreased at {}", n);
            previous = current;
        }
        assert_eq!(previous, BumpType::Major);
    }

    #[test]
    fn test_release_worthy() {
        assert!(is_release_worthy(&commit(CommitType::Fix, false)));
        assert!(is_release_worthy(&commit(CommitType::Chore, true)));
        assert!(!is_release_worthy(&commit(CommitType::Ci, false)));
    }
}
