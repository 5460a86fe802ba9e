//! Pure release planning
//!
//! Turns the manifest and the commits since the last release into one
//! [`PackageChanges`] per package that needs a new version for the target.

use liftoff_changelog::formatter::MarkdownFormatter;
use liftoff_changelog::{classify, ChangelogGenerator};
use liftoff_core::config::ChangelogConfig;
use liftoff_core::error::Result;
use liftoff_core::types::{package_name, PackageChanges};
use liftoff_core::PackageManifest;
use liftoff_github::naming::{fingerprint, pr_title};
use liftoff_github::{filter_for_package, RemoteCommit};
use liftoff_strategies::{determine_bump, next_version, BumpType};
use serde::Serialize;
use tracing::{debug, info};

/// Changes computed for one release target
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReleasePlan {
    /// Release target
    pub target: String,
    /// One entry per package with something to release, in path order
    pub changes: Vec<PackageChanges>,
}

/// Inputs to [`ReleasePlan::compute`]
pub struct PlanInputs<'a> {
    /// Release manifest from the default branch
    pub manifest: &'a PackageManifest,
    /// Commits since the last release, oldest first
    pub commits: &'a [RemoteCommit],
    /// Release target
    pub target: &'a str,
    /// Repository name, used to name the root package
    pub repo: &'a str,
    /// Repository URL for commit links
    pub repo_url: Option<String>,
    /// Changelog rendering settings
    pub changelog: &'a ChangelogConfig,
}

impl ReleasePlan {
    /// Compute the plan for every package in the manifest
    pub fn compute(inputs: PlanInputs<'_>) -> Result<Self> {
        let mut formatter = MarkdownFormatter::new();
        if let Some(url) = &inputs.repo_url {
            formatter = formatter.with_repo_url(url.clone());
        }
        let generator = ChangelogGenerator::new(inputs.changelog.clone()).with_formatter(formatter);

        let mut changes = Vec::new();
        for (path, versions) in inputs.manifest.iter() {
            let commits: Vec<_> = filter_for_package(path, inputs.commits)
                .into_iter()
                .flat_map(|c| classify(&c.message, &c.sha))
                .collect();
            let bump = determine_bump(&commits);
            let current = versions.target(inputs.target).cloned();

            if bump.is_bump() {
                let new_version = next_version(&versions.latest, bump, None)?;
                debug!(path, %bump, from = %versions.latest, to = %new_version, "package needs a release");
                changes.push(PackageChanges {
                    path: path.to_string(),
                    name: package_name(path, inputs.repo),
                    current_version: current,
                    new_version,
                    changelog: generator.generate_formatted(&commits),
                    commits,
                    release_target: inputs.target.to_string(),
                });
            } else if versions.is_behind(inputs.target) {
                debug!(path, latest = %versions.latest, "target lags behind latest");
                changes.push(PackageChanges {
                    path: path.to_string(),
                    name: package_name(path, inputs.repo),
                    current_version: current,
                    new_version: versions.latest.clone(),
                    commits: Vec::new(),
                    changelog: String::new(),
                    release_target: inputs.target.to_string(),
                });
            }
        }

        info!(
            target = inputs.target,
            packages = changes.len(),
            commits = inputs.commits.len(),
            "computed release plan"
        );
        Ok(Self {
            target: inputs.target.to_string(),
            changes,
        })
    }

    /// Whether nothing needs releasing or fast-forwarding
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Changes with commits behind them
    pub fn bumped(&self) -> impl Iterator<Item = &PackageChanges> {
        self.changes.iter().filter(|c| !c.is_catch_up())
    }

    /// Whether every change only advances the manifest
    pub fn is_catch_up_only(&self) -> bool {
        !self.is_empty() && self.changes.iter().all(PackageChanges::is_catch_up)
    }

    /// Change for a package path
    pub fn get(&self, path: &str) -> Option<&PackageChanges> {
        self.changes.iter().find(|c| c.path == path)
    }

    /// Bump recorded for a package (`None` for catch-ups)
    pub fn bump_for(&self, path: &str) -> BumpType {
        self.get(path)
            .map(|c| determine_bump(&c.commits))
            .unwrap_or_default()
    }

    /// Release PR title for this plan
    pub fn title(&self) -> String {
        pr_title(&self.changes, &self.target)
    }

    /// Fingerprint of this plan on top of `base_sha`
    pub fn fingerprint(&self, base_sha: &str) -> String {
        fingerprint(base_sha, &self.changes)
    }
}
