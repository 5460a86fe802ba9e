//! Core types for liftoff

use semver::Version;
use serde::{Deserialize, Serialize};

/// Conventional commit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitType {
    /// New feature
    Feat,
    /// Bug fix
    Fix,
    /// Documentation
    Docs,
    /// Code style (formatting, etc.)
    Style,
    /// Refactoring
    Refactor,
    /// Performance improvement
    Perf,
    /// Tests
    Test,
    /// Chores (maintenance)
    Chore,
    /// Reverting changes
    Revert,
    /// CI configuration
    Ci,
    /// Build system
    Build,
}

impl CommitType {
    /// Returns the string representation of the commit type
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Feat => "feat",
            Self::Fix => "fix",
            Self::Docs => "docs",
            Self::Style => "style",
            Self::Refactor => "refactor",
            Self::Perf => "perf",
            Self::Test => "test",
            Self::Chore => "chore",
            Self::Revert => "revert",
            Self::Ci => "ci",
            Self::Build => "build",
        }
    }
}

impl std::fmt::Display for CommitType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for CommitType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "feat" => Ok(Self::Feat),
            "fix" => Ok(Self::Fix),
            "docs" => Ok(Self::Docs),
            "style" => Ok(Self::Style),
            "refactor" => Ok(Self::Refactor),
            "perf" => Ok(Self::Perf),
            "test" => Ok(Self::Test),
            "chore" => Ok(Self::Chore),
            "revert" => Ok(Self::Revert),
            "ci" => Ok(Self::Ci),
            "build" => Ok(Self::Build),
            _ => Err(format!("Unknown commit type: {}", s)),
        }
    }
}

/// A commit message classified against the conventional-commit grammar
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConventionalCommit {
    /// Commit type
    pub commit_type: CommitType,
    /// Scope (optional, in parentheses)
    pub scope: Option<String>,
    /// Whether this is a breaking change
    pub breaking: bool,
    /// Subject text, or the whole raw message for unparsable commits
    pub message: String,
    /// Commit the message came from
    pub source_ref: String,
}

/// Per-invocation record of one package's pending release
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageChanges {
    /// Package path relative to the repository root (`.` is the root package)
    pub path: String,
    /// Display name of the package
    pub name: String,
    /// Version the target currently has, if any
    pub current_version: Option<Version>,
    /// Version this release assigns
    pub new_version: Version,
    /// Commits that produced the release
    pub commits: Vec<ConventionalCommit>,
    /// Rendered changelog entry
    pub changelog: String,
    /// Release target the version is assigned to
    pub release_target: String,
}

impl PackageChanges {
    /// Whether this is the repository-root package
    pub fn is_root(&self) -> bool {
        is_root_path(&self.path)
    }

    /// Whether this change only advances the manifest (no commits)
    pub fn is_catch_up(&self) -> bool {
        self.commits.is_empty()
    }
}

/// Whether a package path denotes the repository root
pub fn is_root_path(path: &str) -> bool {
    path.is_empty() || path == "." || path == "./"
}

/// Display name for a package path (its last path segment, or the repo name for the root)
pub fn package_name(path: &str, repo: &str) -> String {
    if is_root_path(path) {
        return repo.to_string();
    }
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
        .to_string()
}

/// A package version that was tagged and released
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasedPackage {
    /// Package path
    pub path: String,
    /// Release target
    pub target: String,
    /// Released version
    pub version: String,
}

/// Result of one invocation, as reported to the CI platform
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseOutput {
    /// Whether any tag or release was cut
    pub released: bool,
    /// Released packages
    pub packages: Vec<ReleasedPackage>,
    /// Whether the release was a prerelease
    pub prerelease: bool,
    /// Release PR opened or updated by this run
    pub pull_request: Option<u64>,
}

impl ReleaseOutput {
    /// Output of a run that released `packages`
    pub fn released(packages: Vec<ReleasedPackage>, prerelease: bool) -> Self {
        Self {
            released: !packages.is_empty(),
            packages,
            prerelease,
            pull_request: None,
        }
    }

    /// Output of a run that opened or updated a release PR
    pub fn pull_request(number: u64) -> Self {
        Self {
            pull_request: Some(number),
            ..Self::default()
        }
    }

    /// The single released version, when exactly one package was released
    pub fn version(&self) -> Option<&str> {
        match self.packages.as_slice() {
            [single] => Some(single.version.as_str()),
            _ => None,
        }
    }

    /// JSON array of `{path, target, version}` for every released package
    pub fn versions_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.packages)
    }
}
