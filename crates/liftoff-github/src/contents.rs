//! Default-branch file contents: the manifest, changelogs, and version carriers

use std::collections::HashMap;

use liftoff_adapters::repo_relative;
use liftoff_changelog::file::extract_section;
use liftoff_core::error::Result;
use liftoff_core::PackageManifest;
use semver::Version;
use tracing::{debug, instrument, warn};

use crate::gateway::{encode_path, encode_segment, GitHubGateway};
use crate::types::FileEdit;

/// Whether a unified diff adds a line naming `"<target>"`
fn patch_mentions_target(patch: &str, target: &str) -> bool {
    let needle = format!("\"{}\"", target);
    patch
        .lines()
        .filter(|line| line.starts_with('+') && !line.starts_with("+++"))
        .any(|line| line.contains(&needle))
}

impl GitHubGateway {
    #[instrument(skip(self))]
    pub(crate) async fn fetch_file(&self, path: &str) -> Result<Option<String>> {
        let branch = self.resolve_default_branch().await?;
        let api_path = self.client.repo_path(&format!(
            "/contents/{}?ref={}",
            encode_path(path.trim_start_matches("./")),
            encode_segment(&branch)
        ));
        let content = self.client.get_raw(&api_path).await?;
        debug!(path, found = content.is_some(), "read file from default branch");
        Ok(content)
    }

    #[instrument(skip(self))]
    pub(crate) async fn fetch_manifest(&self, path: &str, target: &str) -> PackageManifest {
        match self.fetch_file(path).await {
            Ok(Some(content)) => PackageManifest::parse_or_empty(&content, target),
            Ok(None) => {
                warn!(path, "release manifest not found on default branch");
                PackageManifest::new()
            }
            Err(e) => {
                warn!(path, error = %e, "could not read release manifest, treating as empty");
                PackageManifest::new()
            }
        }
    }

    #[instrument(skip(self))]
    pub(crate) async fn manifest_touched_at_head(&self, path: &str, target: &str) -> Result<bool> {
        let branch = self.resolve_default_branch().await?;
        let head = self.fetch_branch_head(&branch).await?;
        let commit = self.fetch_commit(&head).await?;

        let touched = commit.files.iter().any(|file| {
            file.filename == path
                && file
                    .patch
                    .as_deref()
                    .is_some_and(|patch| patch_mentions_target(patch, target))
        });
        debug!(head = %head, touched, "checked manifest diff in latest commit");
        Ok(touched)
    }

    #[instrument(skip(self), fields(version = %version))]
    pub(crate) async fn fetch_changelog_section(
        &self,
        path: &str,
        version: &Version,
    ) -> Result<Option<String>> {
        let file = repo_relative(path, &self.settings.changelog_file);
        let Some(content) = self.fetch_file(&file).await? else {
            return Ok(None);
        };
        Ok(extract_section(&content, &version.to_string()))
    }

    /// Rewrite the package's version carrier as it exists on the default branch
    #[instrument(skip(self), fields(version = %version))]
    pub(crate) async fn rewrite_package_version(
        &self,
        path: &str,
        version: &Version,
    ) -> Result<FileEdit> {
        let mut files = HashMap::new();
        for name in self.carriers.file_names() {
            let file = repo_relative(path, name);
            if let Some(content) = self.fetch_file(&file).await? {
                files.insert(file, content);
            }
        }

        let edit = self
            .carriers
            .rewrite_with(path, &version.to_string(), |file| Ok(files.get(file).cloned()))?;
        Ok(FileEdit::new(edit.path, edit.content))
    }
}
