//! In-memory [`SourceControl`] for exercising the orchestrator

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use liftoff_adapters::{repo_relative, CarrierRegistry};
use liftoff_changelog::file::extract_section;
use liftoff_core::config::LabelConfig;
use liftoff_core::error::{RemoteError, Result};
use liftoff_core::types::{PackageChanges, ReleasedPackage};
use liftoff_core::PackageManifest;
use liftoff_github::naming::tag_name;
use liftoff_github::{
    FileEdit, PullRequest, PullRequestState, ReleasePrRequest, RemoteCommit, SourceControl,
};
use liftoff_strategies::SemVerStrategy;
use semver::Version;

#[derive(Debug, Clone)]
pub struct MemoryRelease {
    pub path: String,
    pub tag: String,
    pub version: Version,
    pub prerelease: bool,
    pub commitish: String,
    pub body: String,
}

#[derive(Debug, Default)]
pub struct State {
    pub heads: HashMap<String, String>,
    pub files: HashMap<String, String>,
    pub commits: Vec<RemoteCommit>,
    pub pulls: BTreeMap<u64, PullRequest>,
    pub commit_pulls: HashMap<String, u64>,
    pub branch_edits: HashMap<String, Vec<FileEdit>>,
    pub releases: Vec<MemoryRelease>,
    pub comments: Vec<(u64, String)>,
    pub manifest_touched: bool,
    next_number: u64,
}

pub struct MemoryGateway {
    state: Mutex<State>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        let mut state = State {
            next_number: 100,
            ..State::default()
        };
        state.heads.insert("main".to_string(), "base0".to_string());
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.state().files.insert(path.to_string(), content.to_string());
        self
    }

    pub fn with_commit(self, commit: RemoteCommit) -> Self {
        self.state().commits.push(commit);
        self
    }

    pub fn with_pull(self, pr: PullRequest) -> Self {
        self.state().pulls.insert(pr.number, pr);
        self
    }

    /// Merge a PR into main, applying its branch edits
    pub fn merge(&self, number: u64) -> String {
        let mut state = self.state();
        let sha = format!("merge{}", number);
        let Some(pr) = state.pulls.get_mut(&number) else {
            panic!("no PR #{}", number);
        };
        pr.state = PullRequestState::Merged;
        pr.merge_commit_sha = Some(sha.clone());
        let title = pr.title.clone();
        let branch = pr.head_ref.clone();

        let edits = state.branch_edits.remove(&branch).unwrap_or_default();
        let files: Vec<String> = edits.iter().map(|e| e.path.clone()).collect();
        for edit in edits {
            state.files.insert(edit.path, edit.content);
        }
        state
            .commits
            .push(RemoteCommit::new(sha.clone(), format!("{} (#{})", title, number)).with_files(files));
        state.heads.insert("main".to_string(), sha.clone());
        state.commit_pulls.insert(sha.clone(), number);
        sha
    }

    pub fn pull(&self, number: u64) -> PullRequest {
        self.state().pulls[&number].clone()
    }

    pub fn edits(&self, branch: &str) -> Vec<FileEdit> {
        self.state().branch_edits.get(branch).cloned().unwrap_or_default()
    }

    pub fn tags(&self) -> Vec<String> {
        self.state().releases.iter().map(|r| r.tag.clone()).collect()
    }
}

#[async_trait]
impl SourceControl for MemoryGateway {
    async fn default_branch(&self) -> Result<String> {
        Ok("main".to_string())
    }

    async fn branch_head(&self, branch: &str) -> Result<String> {
        self.state()
            .heads
            .get(branch)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("branch {}", branch)).into())
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool> {
        Ok(self.state().heads.contains_key(branch))
    }

    async fn commits_since_last_release(
        &self,
        _target: Option<&str>,
        _head: &str,
    ) -> Result<Vec<RemoteCommit>> {
        Ok(self.state().commits.clone())
    }

    async fn read_manifest(&self, path: &str, target: &str) -> PackageManifest {
        match self.state().files.get(path) {
            Some(content) => PackageManifest::parse_or_empty(content, target),
            None => PackageManifest::new(),
        }
    }

    async fn read_file(&self, path: &str) -> Result<Option<String>> {
        Ok(self.state().files.get(path).cloned())
    }

    async fn pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
        Ok(self.state().pulls.get(&number).cloned())
    }

    async fn pull_request_for_commit(&self, sha: &str) -> Result<Option<PullRequest>> {
        let state = self.state();
        Ok(state
            .commit_pulls
            .get(sha)
            .and_then(|n| state.pulls.get(n))
            .cloned())
    }

    async fn find_release_pr(
        &self,
        target: &str,
        title: Option<&str>,
    ) -> Result<Option<PullRequest>> {
        let labels = LabelConfig::default();
        let state = self.state();
        let open: Vec<&PullRequest> = state.pulls.values().filter(|p| p.is_open()).collect();

        let by_label = open.iter().find(|p| {
            p.has_label(&labels.pending) && p.has_label(&labels.target_label(target))
        });
        let by_title = || title.and_then(|t| open.iter().find(|p| p.title == t));
        Ok(by_label.or_else(by_title).map(|p| (*p).clone()))
    }

    async fn was_manifest_touched_in_last_commit(&self, _path: &str, _target: &str) -> Result<bool> {
        Ok(self.state().manifest_touched)
    }

    async fn last_release_version(&self, path: &str) -> Result<Option<Version>> {
        Ok(self
            .state()
            .releases
            .iter()
            .filter(|r| r.path == path && !r.prerelease)
            .map(|r| r.version.clone())
            .max())
    }

    async fn latest_prerelease_ordinal(&self, path: &str, base: &Version) -> Result<Option<u64>> {
        let strategy = SemVerStrategy::new();
        Ok(self
            .state()
            .releases
            .iter()
            .filter(|r| r.path == path)
            .filter_map(|r| strategy.prerelease_ordinal(&r.version, base))
            .max())
    }

    async fn prerelease_at_commit(
        &self,
        path: &str,
        base: &Version,
        sha: &str,
    ) -> Result<Option<Version>> {
        let strategy = SemVerStrategy::new();
        Ok(self
            .state()
            .releases
            .iter()
            .filter(|r| r.path == path && r.commitish == sha)
            .filter(|r| strategy.prerelease_ordinal(&r.version, base).is_some())
            .map(|r| r.version.clone())
            .max())
    }

    async fn changelog_section(&self, path: &str, version: &Version) -> Result<Option<String>> {
        let file = repo_relative(path, "CHANGELOG.md");
        Ok(self
            .state()
            .files
            .get(&file)
            .and_then(|content| extract_section(content, &version.to_string())))
    }

    async fn write_package_version(&self, path: &str, version: &Version) -> Result<FileEdit> {
        let files = self.state().files.clone();
        let edit = CarrierRegistry::new()
            .rewrite_with(path, &version.to_string(), |file| Ok(files.get(file).cloned()))?;
        Ok(FileEdit::new(edit.path, edit.content))
    }

    async fn open_or_update_release_pr(&self, request: &ReleasePrRequest) -> Result<PullRequest> {
        let mut state = self.state();
        let existing = state
            .pulls
            .values()
            .find(|p| p.is_open() && p.head_ref == request.branch)
            .map(|p| p.number);
        let number = match existing {
            Some(n) => n,
            None => {
                state.next_number += 1;
                state.next_number
            }
        };

        let head_sha = format!("release{}-{}", number, request.base_sha);
        let mut labels = state
            .pulls
            .get(&number)
            .map(|p| p.labels.clone())
            .unwrap_or_default();
        for label in &request.labels {
            if !labels.contains(label) {
                labels.push(label.clone());
            }
        }

        let pr = PullRequest {
            number,
            title: request.title.clone(),
            body: request.body.clone(),
            state: PullRequestState::Open,
            labels,
            head_ref: request.branch.clone(),
            base_ref: request.base.clone(),
            head_sha: head_sha.clone(),
            merge_commit_sha: None,
        };
        state.pulls.insert(number, pr.clone());
        state
            .branch_edits
            .insert(request.branch.clone(), request.edits.clone());
        state.heads.insert(request.branch.clone(), head_sha);
        Ok(pr)
    }

    async fn cut_release(
        &self,
        changes: &[PackageChanges],
        prerelease: bool,
        commitish: &str,
    ) -> Result<Vec<ReleasedPackage>> {
        let mut state = self.state();
        let mut released = Vec::new();
        for change in changes {
            let tag = tag_name(&change.path, &change.new_version);
            if !state.releases.iter().any(|r| r.tag == tag) {
                state.releases.push(MemoryRelease {
                    path: change.path.clone(),
                    tag,
                    version: change.new_version.clone(),
                    prerelease,
                    commitish: commitish.to_string(),
                    body: change.changelog.clone(),
                });
            }
            released.push(ReleasedPackage {
                path: change.path.clone(),
                target: change.release_target.clone(),
                version: change.new_version.to_string(),
            });
        }
        if !prerelease {
            state.commits.clear();
        }
        Ok(released)
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        let mut state = self.state();
        let pr = state
            .pulls
            .get_mut(&number)
            .ok_or_else(|| RemoteError::NotFound(format!("pull {}", number)))?;
        for label in labels {
            if !pr.labels.contains(label) {
                pr.labels.push(label.clone());
            }
        }
        Ok(())
    }

    async fn remove_label(&self, number: u64, label: &str) -> Result<()> {
        if let Some(pr) = self.state().pulls.get_mut(&number) {
            pr.labels.retain(|l| l != label);
        }
        Ok(())
    }

    async fn comment(&self, number: u64, body: &str) -> Result<()> {
        self.state().comments.push((number, body.to_string()));
        Ok(())
    }
}
