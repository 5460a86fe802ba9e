//! The source-control gateway contract

use async_trait::async_trait;
use liftoff_core::error::Result;
use liftoff_core::types::{is_root_path, PackageChanges, ReleasedPackage};
use liftoff_core::PackageManifest;
use semver::Version;
use tracing::warn;

use crate::types::{FileEdit, PullRequest, ReleasePrRequest, RemoteCommit};

/// Everything the release orchestrator reads from or writes to the hosting
/// platform.
///
/// Reads fail soft where a safe fallback exists. Writes fail hard except for
/// conflicts that show an earlier run already made the same progress.
#[async_trait]
pub trait SourceControl: Send + Sync {
    /// Name of the repository's default branch
    async fn default_branch(&self) -> Result<String>;

    /// Current head commit of `branch`
    async fn branch_head(&self, branch: &str) -> Result<String>;

    /// Whether `branch` exists on the remote
    async fn branch_exists(&self, branch: &str) -> Result<bool>;

    /// Commits after the latest non-prerelease release of `target` (any
    /// target when `None`) up to `head`, oldest first. Without a prior
    /// release, the last `lookback` commits.
    async fn commits_since_last_release(
        &self,
        target: Option<&str>,
        head: &str,
    ) -> Result<Vec<RemoteCommit>>;

    /// Release manifest on the default branch; missing or unparsable
    /// content yields an empty manifest
    async fn read_manifest(&self, path: &str, target: &str) -> PackageManifest;

    /// File content on the default branch, `None` when absent
    async fn read_file(&self, path: &str) -> Result<Option<String>>;

    /// Pull request by number
    async fn pull_request(&self, number: u64) -> Result<Option<PullRequest>>;

    /// Pull request that produced `sha` on the default branch
    async fn pull_request_for_commit(&self, sha: &str) -> Result<Option<PullRequest>>;

    /// Open release PR for `target`, by labels and then by `title`
    async fn find_release_pr(&self, target: &str, title: Option<&str>)
        -> Result<Option<PullRequest>>;

    /// Whether the default branch's latest commit changed `target` in the manifest
    async fn was_manifest_touched_in_last_commit(&self, path: &str, target: &str) -> Result<bool>;

    /// Version of the latest non-prerelease release of a package
    async fn last_release_version(&self, path: &str) -> Result<Option<Version>>;

    /// Highest `-rc.N` ordinal already used for `base`
    async fn latest_prerelease_ordinal(&self, path: &str, base: &Version) -> Result<Option<u64>>;

    /// Highest `-rc.N` prerelease of `base` whose tag points at `sha`
    async fn prerelease_at_commit(
        &self,
        path: &str,
        base: &Version,
        sha: &str,
    ) -> Result<Option<Version>>;

    /// Changelog entry for `version` from the package's changelog file
    async fn changelog_section(&self, path: &str, version: &Version) -> Result<Option<String>>;

    /// Rewrite the package's version carrier. The edit is returned, not committed.
    async fn write_package_version(&self, path: &str, version: &Version) -> Result<FileEdit>;

    /// Create or force-update the release branch and its PR
    async fn open_or_update_release_pr(&self, request: &ReleasePrRequest) -> Result<PullRequest>;

    /// Create one tag and one release per change at `commitish`
    async fn cut_release(
        &self,
        changes: &[PackageChanges],
        prerelease: bool,
        commitish: &str,
    ) -> Result<Vec<ReleasedPackage>>;

    /// Add labels to a PR
    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()>;

    /// Remove a label from a PR
    async fn remove_label(&self, number: u64, label: &str) -> Result<()>;

    /// Post a comment on a PR
    async fn comment(&self, number: u64, body: &str) -> Result<()>;

    /// Flip a PR from `pending` to `released`. Removing `pending` is best-effort.
    async fn mark_released(&self, number: u64, pending: &str, released: &str) -> Result<()> {
        if let Err(e) = self.remove_label(number, pending).await {
            warn!(number, label = pending, error = %e, "could not remove pending label");
        }
        self.add_labels(number, &[released.to_string()]).await
    }
}

/// Commits touching files below `path`; the root package matches every commit
pub fn filter_for_package<'a>(path: &str, commits: &'a [RemoteCommit]) -> Vec<&'a RemoteCommit> {
    if is_root_path(path) {
        return commits.iter().collect();
    }

    let dir = path.trim_end_matches('/');
    let prefix = format!("{}/", dir);
    commits
        .iter()
        .filter(|c| c.files.iter().any(|f| f == dir || f.starts_with(&prefix)))
        .collect()
}
