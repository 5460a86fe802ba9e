//! GitHub-backed source-control gateway

use async_trait::async_trait;
use liftoff_adapters::CarrierRegistry;
use liftoff_core::config::{Config, LabelConfig};
use liftoff_core::error::Result;
use liftoff_core::types::{PackageChanges, ReleasedPackage};
use liftoff_core::PackageManifest;
use semver::Version;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument};

use crate::client::GitHubClient;
use crate::traits::SourceControl;
use crate::types::{FileEdit, PullRequest, ReleasePrRequest, RemoteCommit};

/// Settings the gateway needs beyond repository coordinates
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Changelog file name inside each package directory
    pub changelog_file: String,
    /// Lifecycle labels
    pub labels: LabelConfig,
    /// Commits scanned when a target has never been released
    pub lookback: usize,
    /// Default branch override
    pub default_branch: Option<String>,
}

impl GatewaySettings {
    /// Derive gateway settings from the loaded configuration
    pub fn from_config(config: &Config) -> Self {
        Self {
            changelog_file: config.changelog.file.clone(),
            labels: config.labels.clone(),
            lookback: config.release.lookback,
            default_branch: config.release.default_branch.clone(),
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Source-control gateway talking to the GitHub REST API
pub struct GitHubGateway {
    pub(crate) client: GitHubClient,
    pub(crate) settings: GatewaySettings,
    pub(crate) carriers: CarrierRegistry,
    default_branch: OnceCell<String>,
}

impl GitHubGateway {
    /// Create a gateway over an authenticated client
    pub fn new(client: GitHubClient, settings: GatewaySettings) -> Self {
        debug!(owner = client.owner(), repo = client.repo(), "creating github gateway");
        Self {
            client,
            settings,
            carriers: CarrierRegistry::new(),
            default_branch: OnceCell::new(),
        }
    }

    /// Replace the version carrier registry
    pub fn with_carriers(mut self, carriers: CarrierRegistry) -> Self {
        self.carriers = carriers;
        self
    }

    /// The underlying REST client
    pub fn client(&self) -> &GitHubClient {
        &self.client
    }

    /// Gateway settings
    pub fn settings(&self) -> &GatewaySettings {
        &self.settings
    }

    /// Default branch, resolved once per gateway
    #[instrument(skip(self))]
    pub async fn resolve_default_branch(&self) -> Result<String> {
        let branch = self
            .default_branch
            .get_or_try_init(|| async {
                if let Some(branch) = &self.settings.default_branch {
                    return Ok(branch.clone());
                }
                let repo: RepositoryInfo = self.client.get(&self.client.repo_path("")).await?;
                info!(branch = %repo.default_branch, "resolved default branch");
                Ok::<_, liftoff_core::LiftoffError>(repo.default_branch)
            })
            .await?;
        Ok(branch.clone())
    }
}

#[derive(serde::Deserialize)]
struct RepositoryInfo {
    default_branch: String,
}

/// Percent-encode one URL path segment
pub(crate) fn encode_segment(segment: &str) -> String {
    let mut out = String::with_capacity(segment.len());
    for byte in segment.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}

/// Percent-encode a `/`-separated repository path, keeping the separators
pub(crate) fn encode_path(path: &str) -> String {
    path.split('/')
        .map(encode_segment)
        .collect::<Vec<_>>()
        .join("/")
}

#[async_trait]
impl SourceControl for GitHubGateway {
    async fn default_branch(&self) -> Result<String> {
        self.resolve_default_branch().await
    }

    async fn branch_head(&self, branch: &str) -> Result<String> {
        self.fetch_branch_head(branch).await
    }

    async fn branch_exists(&self, branch: &str) -> Result<bool> {
        Ok(self.find_branch_head(branch).await?.is_some())
    }

    async fn commits_since_last_release(
        &self,
        target: Option<&str>,
        head: &str,
    ) -> Result<Vec<RemoteCommit>> {
        self.list_commits_since_release(target, head).await
    }

    async fn read_manifest(&self, path: &str, target: &str) -> PackageManifest {
        self.fetch_manifest(path, target).await
    }

    async fn read_file(&self, path: &str) -> Result<Option<String>> {
        self.fetch_file(path).await
    }

    async fn pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
        self.fetch_pull_request(number).await
    }

    async fn pull_request_for_commit(&self, sha: &str) -> Result<Option<PullRequest>> {
        self.fetch_pull_request_for_commit(sha).await
    }

    async fn find_release_pr(
        &self,
        target: &str,
        title: Option<&str>,
    ) -> Result<Option<PullRequest>> {
        self.search_release_pr(target, title).await
    }

    async fn was_manifest_touched_in_last_commit(&self, path: &str, target: &str) -> Result<bool> {
        self.manifest_touched_at_head(path, target).await
    }

    async fn last_release_version(&self, path: &str) -> Result<Option<Version>> {
        self.find_last_release_version(path).await
    }

    async fn latest_prerelease_ordinal(&self, path: &str, base: &Version) -> Result<Option<u64>> {
        self.find_latest_prerelease_ordinal(path, base).await
    }

    async fn prerelease_at_commit(
        &self,
        path: &str,
        base: &Version,
        sha: &str,
    ) -> Result<Option<Version>> {
        self.find_prerelease_at(path, base, sha).await
    }

    async fn changelog_section(&self, path: &str, version: &Version) -> Result<Option<String>> {
        self.fetch_changelog_section(path, version).await
    }

    async fn write_package_version(&self, path: &str, version: &Version) -> Result<FileEdit> {
        self.rewrite_package_version(path, version).await
    }

    async fn open_or_update_release_pr(&self, request: &ReleasePrRequest) -> Result<PullRequest> {
        self.upsert_release_pr(request).await
    }

    async fn cut_release(
        &self,
        changes: &[PackageChanges],
        prerelease: bool,
        commitish: &str,
    ) -> Result<Vec<ReleasedPackage>> {
        self.create_releases(changes, prerelease, commitish).await
    }

    async fn add_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        self.post_labels(number, labels).await
    }

    async fn remove_label(&self, number: u64, label: &str) -> Result<()> {
        self.delete_label(number, label).await
    }

    async fn comment(&self, number: u64, body: &str) -> Result<()> {
        self.post_comment(number, body).await
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use wiremock::MockServer;

    pub async fn gateway(server: &MockServer) -> GitHubGateway {
        let client = GitHubClient::new(server.uri(), "test-token", "acme", "mono").unwrap();
        let settings = GatewaySettings {
            default_branch: Some("main".to_string()),
            ..GatewaySettings::default()
        };
        GitHubGateway::new(client, settings)
    }
}
