//! Lifecycle state reconstructed from the remote at the start of a run
//!
//! Nothing persists between runs. Every fact the rules look at is read once
//! here and then treated as immutable for the rest of the run.

use std::collections::BTreeMap;

use liftoff_core::config::Config;
use liftoff_core::error::Result;
use liftoff_core::{PackageManifest, ReleaseContext};
use liftoff_github::{PullRequest, RemoteCommit, SourceControl};
use semver::Version;
use serde::Serialize;
use tracing::{debug, info, instrument};

use crate::plan::ReleasePlan;

/// Everything known about the repository at the start of a run
#[derive(Debug, Clone, Serialize)]
pub struct Snapshot {
    /// Triggering event
    pub context: ReleaseContext,
    /// Release target of this run
    pub target: String,
    /// Default branch name
    pub default_branch: String,
    /// Head of the default branch
    pub base_sha: String,
    /// Release manifest from the default branch
    pub manifest: PackageManifest,
    /// Triggering PR, or on push the merged PR that produced the head commit
    pub pull_request: Option<PullRequest>,
    /// Whether the triggering PR comes from a release branch
    pub on_release_branch: bool,
    /// Whether that release branch still exists
    pub release_branch_exists: bool,
    /// Commits since the target's last release, oldest first
    pub commits: Vec<RemoteCommit>,
    /// Whether the latest default-branch commit changed this target in the manifest
    pub manifest_touched: bool,
    /// Open release PR for this target
    pub standing_pr: Option<PullRequest>,
    /// Target versions in the manifest that have no release yet
    pub unreleased: BTreeMap<String, Version>,
    /// Prereleases already cut from the triggering PR's head, by package
    pub prereleased: BTreeMap<String, Version>,
}

impl Snapshot {
    /// Read the snapshot through `gateway`
    #[instrument(skip_all, fields(target = %config.release.target))]
    pub async fn capture<S>(gateway: &S, config: &Config, context: ReleaseContext) -> Result<Self>
    where
        S: SourceControl + ?Sized,
    {
        let target = config.release.target.clone();
        let default_branch = gateway.default_branch().await?;
        let base_sha = gateway.branch_head(&default_branch).await?;
        let manifest = gateway.read_manifest(&config.manifest.path, &target).await;

        let pull_request = match (context.is_pull_request, context.pull_request_number) {
            (true, Some(number)) => gateway.pull_request(number).await?,
            (true, None) => None,
            (false, _) => {
                let sha = if context.head_sha.is_empty() {
                    base_sha.as_str()
                } else {
                    context.head_sha.as_str()
                };
                gateway.pull_request_for_commit(sha).await?
            }
        };

        let on_release_branch = context.is_pull_request
            && context
                .head_ref
                .starts_with(config.release.branch_prefix.trim_end_matches('/'));
        let release_branch_exists = if on_release_branch {
            gateway.branch_exists(&context.head_ref).await?
        } else {
            true
        };

        let unmerged_pr = context.is_pull_request
            && pull_request.as_ref().map_or(true, |pr| !pr.is_merged());
        let head = if unmerged_pr && !context.head_sha.is_empty() {
            context.head_sha.clone()
        } else {
            base_sha.clone()
        };
        let commits = gateway
            .commits_since_last_release(Some(&target), &head)
            .await?;

        let manifest_touched = if !context.is_pull_request && pull_request.is_none() {
            gateway
                .was_manifest_touched_in_last_commit(&config.manifest.path, &target)
                .await?
        } else {
            false
        };

        let standing_pr = gateway.find_release_pr(&target, None).await?;

        let mut snapshot = Self {
            context,
            target,
            default_branch,
            base_sha,
            manifest,
            pull_request,
            on_release_branch,
            release_branch_exists,
            commits,
            manifest_touched,
            standing_pr,
            unreleased: BTreeMap::new(),
            prereleased: BTreeMap::new(),
        };

        if snapshot.is_merged_release(config) || snapshot.is_deleted_release_branch() {
            snapshot.unreleased = unreleased_versions(gateway, &snapshot.manifest, &snapshot.target).await?;
        }

        info!(
            default_branch = %snapshot.default_branch,
            base_sha = %snapshot.base_sha,
            packages = snapshot.manifest.len(),
            commits = snapshot.commits.len(),
            pull_request = ?snapshot.pull_request.as_ref().map(|p| p.number),
            "captured release snapshot"
        );
        Ok(snapshot)
    }

    /// Look up prereleases of the planned versions that already point at the
    /// prerelease PR's head. Only runs for an open PR carrying the label.
    pub async fn record_prereleases<S>(
        &mut self,
        gateway: &S,
        plan: &ReleasePlan,
        config: &Config,
    ) -> Result<()>
    where
        S: SourceControl + ?Sized,
    {
        let Some(pr) = self.trigger_pr() else {
            return Ok(());
        };
        if !config.prerelease.enabled || !pr.is_open() || !pr.has_label(&config.prerelease.label) {
            return Ok(());
        }

        let head_sha = pr.head_sha.clone();
        for change in plan.bumped() {
            if let Some(version) = gateway
                .prerelease_at_commit(&change.path, &change.new_version, &head_sha)
                .await?
            {
                debug!(path = %change.path, version = %version, head_sha = %head_sha, "prerelease exists at head");
                self.prereleased.insert(change.path.clone(), version);
            }
        }
        Ok(())
    }

    /// The triggering PR, only for pull request events
    pub fn trigger_pr(&self) -> Option<&PullRequest> {
        if self.context.is_pull_request {
            self.pull_request.as_ref()
        } else {
            None
        }
    }

    /// Whether the run was triggered by a push to a branch other than the default one
    pub fn is_foreign_push(&self) -> bool {
        !self.context.is_pull_request
            && !self.context.base_ref.is_empty()
            && self.context.base_ref != self.default_branch
    }

    /// Whether the run is for a release branch deleted after its PR closed
    pub fn is_deleted_release_branch(&self) -> bool {
        self.on_release_branch && !self.release_branch_exists
    }

    /// Whether the PR belongs to this run's release target.
    ///
    /// A PR without any target label belongs to every target.
    pub fn pr_matches_target(&self, pr: &PullRequest, config: &Config) -> bool {
        let prefix = &config.labels.target_prefix;
        pr.has_label(&config.labels.target_label(&self.target))
            || !pr.labels.iter().any(|l| l.starts_with(prefix.as_str()))
    }

    /// Whether this run observes a landed release PR for the target: a merged
    /// PR carrying the pending label or, when no PR resolves, a manifest
    /// change for the target in the latest commit
    pub fn is_merged_release(&self, config: &Config) -> bool {
        match &self.pull_request {
            Some(pr) => {
                pr.is_merged()
                    && pr.has_label(&config.labels.pending)
                    && self.pr_matches_target(pr, config)
            }
            None => !self.context.is_pull_request && self.manifest_touched,
        }
    }
}

/// Manifest target versions newer than the package's last release
async fn unreleased_versions<S>(
    gateway: &S,
    manifest: &PackageManifest,
    target: &str,
) -> Result<BTreeMap<String, Version>>
where
    S: SourceControl + ?Sized,
{
    let mut unreleased = BTreeMap::new();
    for (path, versions) in manifest.iter() {
        let Some(version) = versions.target(target) else {
            continue;
        };
        let released = gateway.last_release_version(path).await?;
        if released.as_ref().map_or(true, |r| version > r) {
            debug!(path, version = %version, released = ?released.map(|r| r.to_string()), "unreleased version");
            unreleased.insert(path.to_string(), version.clone());
        }
    }
    Ok(unreleased)
}
