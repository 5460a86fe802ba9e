//! Gateway types

use serde::{Deserialize, Serialize};

/// A commit on the remote, with the files it touched
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteCommit {
    /// Commit hash (full)
    pub sha: String,
    /// Full commit message
    pub message: String,
    /// Repository paths touched by the commit
    pub files: Vec<String>,
}

impl RemoteCommit {
    /// Create a new RemoteCommit
    pub fn new(sha: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            sha: sha.into(),
            message: message.into(),
            files: Vec::new(),
        }
    }

    /// Set the touched files
    pub fn with_files<I, S>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    /// First 7 characters of the hash
    pub fn short_sha(&self) -> &str {
        &self.sha[..7.min(self.sha.len())]
    }
}

/// Lifecycle state of a pull request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestState {
    /// Open
    Open,
    /// Closed without merging
    Closed,
    /// Merged
    Merged,
}

/// A pull request as the orchestrator sees it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Title
    pub title: String,
    /// Body (markdown)
    pub body: String,
    /// Lifecycle state
    pub state: PullRequestState,
    /// Label names
    pub labels: Vec<String>,
    /// Head branch
    pub head_ref: String,
    /// Base branch
    pub base_ref: String,
    /// Head commit
    pub head_sha: String,
    /// Commit the merge produced, once merged
    pub merge_commit_sha: Option<String>,
}

impl PullRequest {
    /// Whether the PR carries `label`
    pub fn has_label(&self, label: &str) -> bool {
        self.labels.iter().any(|l| l == label)
    }

    /// Whether the PR was merged
    pub fn is_merged(&self) -> bool {
        self.state == PullRequestState::Merged
    }

    /// Whether the PR is still open
    pub fn is_open(&self) -> bool {
        self.state == PullRequestState::Open
    }
}

/// A release object on the remote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Release {
    /// Release id
    pub id: u64,
    /// Tag the release points at
    pub tag_name: String,
    /// Display name
    pub name: String,
    /// Release notes
    pub body: String,
    /// Whether this is a prerelease
    pub prerelease: bool,
    /// Whether this is an unpublished draft
    pub draft: bool,
}

/// A full-content file write included in a release commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileEdit {
    /// Repository path, `/`-separated
    pub path: String,
    /// New content
    pub content: String,
}

impl FileEdit {
    /// Create a new FileEdit
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// Everything needed to upsert the standing release PR for a target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleasePrRequest {
    /// Release target the PR belongs to
    pub target: String,
    /// Branch the release commit is force-written to
    pub branch: String,
    /// Branch the PR merges into
    pub base: String,
    /// Commit the release commit is built on
    pub base_sha: String,
    /// PR title
    pub title: String,
    /// PR body
    pub body: String,
    /// Message of the release commit
    pub commit_message: String,
    /// Labels the PR must carry
    pub labels: Vec<String>,
    /// File writes making up the release commit
    pub edits: Vec<FileEdit>,
}
