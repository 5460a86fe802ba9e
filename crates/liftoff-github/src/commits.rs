//! Commit history since the last release

use liftoff_changelog::classify;
use liftoff_core::error::{RemoteError, Result};
use liftoff_strategies::is_release_worthy;
use serde::Deserialize;
use tracing::{debug, info, instrument};

use crate::gateway::{encode_path, GitHubGateway};
use crate::types::RemoteCommit;

/// Commits requested per comparison page
const PAGE_SIZE: usize = 100;

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCommit {
    pub sha: String,
    pub commit: ApiCommitDetail,
    #[serde(default)]
    pub files: Vec<ApiFile>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiCommitDetail {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiFile {
    pub filename: String,
    #[serde(default)]
    pub previous_filename: Option<String>,
    #[serde(default)]
    pub patch: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Comparison {
    #[serde(default)]
    commits: Vec<ApiCommit>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitRef {
    pub object: GitObject,
}

#[derive(Debug, Deserialize)]
pub(crate) struct GitObject {
    pub sha: String,
}

/// Whether a message contains at least one version-bumping commit
fn is_relevant(message: &str) -> bool {
    classify(message, "").iter().any(is_release_worthy)
}

impl GitHubGateway {
    /// Head commit of a branch, `None` when the branch does not exist
    pub(crate) async fn find_branch_head(&self, branch: &str) -> Result<Option<String>> {
        let path = self
            .client
            .repo_path(&format!("/git/ref/heads/{}", encode_path(branch)));
        let reference: Option<GitRef> = self.client.get_optional(&path).await?;
        Ok(reference.map(|r| r.object.sha))
    }

    pub(crate) async fn fetch_branch_head(&self, branch: &str) -> Result<String> {
        self.find_branch_head(branch)
            .await?
            .ok_or_else(|| RemoteError::NotFound(format!("branch '{}'", branch)).into())
    }

    /// Full commit including its touched files
    pub(crate) async fn fetch_commit(&self, sha: &str) -> Result<ApiCommit> {
        let path = self.client.repo_path(&format!("/commits/{}", sha));
        self.client.get(&path).await
    }

    async fn with_files(&self, commit: ApiCommit) -> Result<RemoteCommit> {
        let detail = self.fetch_commit(&commit.sha).await?;
        let mut files = Vec::with_capacity(detail.files.len());
        for file in detail.files {
            if let Some(previous) = file.previous_filename {
                files.push(previous);
            }
            files.push(file.filename);
        }
        Ok(RemoteCommit::new(commit.sha, commit.commit.message).with_files(files))
    }

    #[instrument(skip(self))]
    pub(crate) async fn list_commits_since_release(
        &self,
        target: Option<&str>,
        head: &str,
    ) -> Result<Vec<RemoteCommit>> {
        match self.find_anchor_release(target).await? {
            Some(release) => {
                info!(tag = %release.tag_name, "collecting commits since last release");
                self.compare_commits(&release.tag_name, head).await
            }
            None => {
                info!(
                    lookback = self.settings.lookback,
                    "no prior release, scanning recent history"
                );
                self.recent_commits(head).await
            }
        }
    }

    /// Commits in `base...head`, oldest first, stopping at the first page
    /// without a version-bumping commit
    async fn compare_commits(&self, base: &str, head: &str) -> Result<Vec<RemoteCommit>> {
        let mut commits = Vec::new();
        let mut page = 1usize;

        loop {
            let path = self.client.repo_path(&format!(
                "/compare/{}...{}?per_page={}&page={}",
                encode_path(base),
                encode_path(head),
                PAGE_SIZE,
                page
            ));
            let comparison: Comparison = self.client.get(&path).await?;
            let count = comparison.commits.len();
            let relevant = comparison
                .commits
                .iter()
                .filter(|c| is_relevant(&c.commit.message))
                .count();

            debug!(page, count, relevant, "read comparison page");
            if relevant == 0 {
                break;
            }

            for commit in comparison.commits {
                commits.push(self.with_files(commit).await?);
            }

            if count < PAGE_SIZE {
                break;
            }
            page += 1;
        }

        Ok(commits)
    }

    /// The last `lookback` commits reachable from `head`, oldest first
    async fn recent_commits(&self, head: &str) -> Result<Vec<RemoteCommit>> {
        let path = self.client.repo_path(&format!(
            "/commits?sha={}&per_page={}",
            encode_path(head),
            PAGE_SIZE.min(self.settings.lookback.max(1))
        ));
        let listed: Vec<ApiCommit> = self
            .client
            .get_all(&path, Some(self.settings.lookback))
            .await?;

        let mut commits = Vec::with_capacity(listed.len());
        for commit in listed.into_iter().rev() {
            commits.push(self.with_files(commit).await?);
        }
        Ok(commits)
    }
}
