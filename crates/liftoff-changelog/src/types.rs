//! Changelog types

use liftoff_core::types::{CommitType, ConventionalCommit};
use serde::{Deserialize, Serialize};

/// Marker placed before every breaking change, whatever its section
pub const BREAKING_MARKER: &str = "**BREAKING**";

/// Changelog sections, in the order they are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionKind {
    /// New features
    Features,
    /// Bug fixes
    Fixes,
    /// Documentation
    Docs,
    /// Refactoring
    Refactors,
    /// Performance improvements
    Perf,
    /// Tests
    Tests,
    /// Chores
    Chores,
    /// Reverts
    Reverts,
    /// Build system
    Build,
    /// Continuous integration
    Ci,
}

impl SectionKind {
    /// All sections in render order
    pub const ALL: [SectionKind; 10] = [
        Self::Features,
        Self::Fixes,
        Self::Docs,
        Self::Refactors,
        Self::Perf,
        Self::Tests,
        Self::Chores,
        Self::Reverts,
        Self::Build,
        Self::Ci,
    ];

    /// Section a commit type is listed under; `style` commits are not listed
    pub fn for_type(commit_type: CommitType) -> Option<Self> {
        match commit_type {
            CommitType::Feat => Some(Self::Features),
            CommitType::Fix => Some(Self::Fixes),
            CommitType::Docs => Some(Self::Docs),
            CommitType::Refactor => Some(Self::Refactors),
            CommitType::Perf => Some(Self::Perf),
            CommitType::Test => Some(Self::Tests),
            CommitType::Chore => Some(Self::Chores),
            CommitType::Revert => Some(Self::Reverts),
            CommitType::Build => Some(Self::Build),
            CommitType::Ci => Some(Self::Ci),
            CommitType::Style => None,
        }
    }

    /// Heading used for the section
    pub fn title(&self) -> &'static str {
        match self {
            Self::Features => "Features",
            Self::Fixes => "Bug Fixes",
            Self::Docs => "Documentation",
            Self::Refactors => "Code Refactoring",
            Self::Perf => "Performance Improvements",
            Self::Tests => "Tests",
            Self::Chores => "Chores",
            Self::Reverts => "Reverts",
            Self::Build => "Build System",
            Self::Ci => "Continuous Integration",
        }
    }
}

/// A section in a changelog
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    /// Which bucket this is
    pub kind: SectionKind,
    /// Commits in this section, in history order
    pub commits: Vec<ConventionalCommit>,
}

impl Section {
    /// Create a new section
    pub fn new(kind: SectionKind) -> Self {
        Self {
            kind,
            commits: Vec::new(),
        }
    }

    /// Section heading
    pub fn title(&self) -> &'static str {
        self.kind.title()
    }

    /// Add a commit to the section
    pub fn add_commit(&mut self, commit: ConventionalCommit) {
        self.commits.push(commit);
    }

    /// Check if section is empty
    pub fn is_empty(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Grouped changes for one release
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChangelogEntry {
    /// Non-empty sections, in render order
    pub sections: Vec<Section>,
}

impl ChangelogEntry {
    /// Add a section, dropping it when empty
    pub fn add_section(&mut self, section: Section) {
        if !section.is_empty() {
            self.sections.push(section);
        }
    }

    /// Section of the given kind, if present
    pub fn section(&self, kind: SectionKind) -> Option<&Section> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Number of breaking commits across all sections
    pub fn breaking_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| s.commits.iter())
            .filter(|c| c.breaking)
            .count()
    }

    /// Check if entry has any content
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
