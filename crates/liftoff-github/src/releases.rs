//! Tags and release objects

use std::ops::ControlFlow;

use liftoff_core::error::Result;
use liftoff_core::types::{is_root_path, PackageChanges, ReleasedPackage};
use liftoff_strategies::SemVerStrategy;
use reqwest::Method;
use semver::Version;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::gateway::{encode_path, GitHubGateway};
use crate::naming::{has_target_marker, parse_tag, release_name, tag_name, tag_prefix, target_marker};
use crate::types::Release;

/// Release pages scanned before giving up
const MAX_RELEASE_PAGES: usize = 10;

#[derive(Debug, Deserialize)]
struct ApiRelease {
    id: u64,
    tag_name: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    prerelease: bool,
    #[serde(default)]
    draft: bool,
}

impl From<ApiRelease> for Release {
    fn from(api: ApiRelease) -> Self {
        Self {
            id: api.id,
            name: api.name.unwrap_or_else(|| api.tag_name.clone()),
            tag_name: api.tag_name,
            body: api.body.unwrap_or_default(),
            prerelease: api.prerelease,
            draft: api.draft,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiRef {
    #[serde(rename = "ref")]
    name: String,
    #[serde(default)]
    object: Option<ApiRefObject>,
}

#[derive(Debug, Deserialize)]
struct ApiRefObject {
    sha: String,
}

/// A `-rc.N` tag of one package and the commit it points at
#[derive(Debug, Clone, PartialEq, Eq)]
struct PrereleaseRef {
    version: Version,
    ordinal: u64,
    sha: Option<String>,
}

/// Body of a release: its changelog followed by the target marker
pub fn release_body(changelog: &str, target: &str) -> String {
    let notes = changelog.trim();
    if notes.is_empty() {
        target_marker(target)
    } else {
        format!("{}\n\n{}", notes, target_marker(target))
    }
}

fn same_package(a: &str, b: &str) -> bool {
    if is_root_path(a) || is_root_path(b) {
        return is_root_path(a) && is_root_path(b);
    }
    a.trim_end_matches('/') == b.trim_end_matches('/')
}

impl GitHubGateway {
    /// Visit published releases, newest first, until `visit` breaks
    async fn scan_releases<F>(&self, mut visit: F) -> Result<()>
    where
        F: FnMut(Release) -> ControlFlow<()>,
    {
        let mut next = Some(self.client.repo_path("/releases?per_page=100"));
        let mut pages = 0usize;

        while let Some(page) = next.take() {
            let (batch, link): (Vec<ApiRelease>, _) = match self.client.get_page(&page).await {
                Ok(result) => result,
                Err(e) if e.is_not_found() => {
                    warn!(error = %e, "releases unavailable, treating as none");
                    return Ok(());
                }
                Err(e) => return Err(e),
            };
            pages += 1;

            for release in batch {
                if visit(release.into()).is_break() {
                    return Ok(());
                }
            }

            if pages >= MAX_RELEASE_PAGES {
                debug!(pages, "stopped scanning releases");
                break;
            }
            next = link;
        }
        Ok(())
    }

    /// Latest non-prerelease release for `target`, or of any target when unscoped
    pub(crate) async fn find_anchor_release(&self, target: Option<&str>) -> Result<Option<Release>> {
        let mut anchor = None;
        self.scan_releases(|release| {
            let scoped = target.map_or(true, |t| has_target_marker(&release.body, t));
            if !release.prerelease && !release.draft && scoped {
                anchor = Some(release);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .await?;
        Ok(anchor)
    }

    #[instrument(skip(self))]
    pub(crate) async fn find_last_release_version(&self, path: &str) -> Result<Option<Version>> {
        let mut highest: Option<Version> = None;
        self.scan_releases(|release| {
            if release.prerelease || release.draft {
                return ControlFlow::Continue(());
            }
            if let Some((tag_path, version)) = parse_tag(&release.tag_name) {
                if same_package(&tag_path, path) && highest.as_ref().map_or(true, |h| version > *h) {
                    highest = Some(version);
                }
            }
            ControlFlow::Continue(())
        })
        .await?;

        debug!(path, version = ?highest.as_ref().map(|v| v.to_string()), "last release version");
        Ok(highest)
    }

    /// Prerelease tags of `path` for `base`, from the matching tag refs
    async fn prerelease_refs(&self, path: &str, base: &Version) -> Result<Vec<PrereleaseRef>> {
        let prefix = format!("{}{}-", tag_prefix(path), base);
        let api_path = self
            .client
            .repo_path(&format!("/git/matching-refs/tags/{}", encode_path(&prefix)));
        let refs: Vec<ApiRef> = match self.client.get_all(&api_path, None).await {
            Ok(refs) => refs,
            Err(e) if e.is_not_found() => Vec::new(),
            Err(e) => return Err(e),
        };

        let strategy = SemVerStrategy::new();
        Ok(refs
            .into_iter()
            .filter_map(|r| {
                let (tag_path, version) = parse_tag(r.name.trim_start_matches("refs/tags/"))?;
                if !same_package(&tag_path, path) {
                    return None;
                }
                let ordinal = strategy.prerelease_ordinal(&version, base)?;
                Some(PrereleaseRef {
                    version,
                    ordinal,
                    sha: r.object.map(|o| o.sha),
                })
            })
            .collect())
    }

    #[instrument(skip(self), fields(base = %base))]
    pub(crate) async fn find_latest_prerelease_ordinal(
        &self,
        path: &str,
        base: &Version,
    ) -> Result<Option<u64>> {
        let ordinal = self
            .prerelease_refs(path, base)
            .await?
            .iter()
            .map(|r| r.ordinal)
            .max();

        debug!(path, ?ordinal, "latest prerelease ordinal");
        Ok(ordinal)
    }

    #[instrument(skip(self), fields(base = %base))]
    pub(crate) async fn find_prerelease_at(
        &self,
        path: &str,
        base: &Version,
        sha: &str,
    ) -> Result<Option<Version>> {
        let found = self
            .prerelease_refs(path, base)
            .await?
            .into_iter()
            .filter(|r| r.sha.as_deref() == Some(sha))
            .max_by_key(|r| r.ordinal)
            .map(|r| r.version);

        debug!(path, sha, version = ?found.as_ref().map(|v| v.to_string()), "prerelease at commit");
        Ok(found)
    }

    /// Create a lightweight tag; an existing tag is not an error
    async fn create_tag(&self, tag: &str, sha: &str) -> Result<()> {
        let body = json!({ "ref": format!("refs/tags/{}", tag), "sha": sha });
        match self
            .client
            .send_no_content(Method::POST, &self.client.repo_path("/git/refs"), Some(&body))
            .await
        {
            Ok(()) => {
                info!(tag, sha, "created tag");
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                warn!(tag, error = %e, "tag already exists, continuing");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, changes), fields(count = changes.len()))]
    pub(crate) async fn create_releases(
        &self,
        changes: &[PackageChanges],
        prerelease: bool,
        commitish: &str,
    ) -> Result<Vec<ReleasedPackage>> {
        let mut released = Vec::with_capacity(changes.len());

        for change in changes {
            let tag = tag_name(&change.path, &change.new_version);
            self.create_tag(&tag, commitish).await?;

            let request = json!({
                "tag_name": tag,
                "target_commitish": commitish,
                "name": release_name(&change.path, &change.new_version),
                "body": release_body(&change.changelog, &change.release_target),
                "prerelease": prerelease,
                "draft": false,
            });
            let result: Result<ApiRelease> = self
                .client
                .send(Method::POST, &self.client.repo_path("/releases"), &request)
                .await;
            match result {
                Ok(release) => info!(tag = %tag, id = release.id, prerelease, "created release"),
                Err(e) if e.is_conflict() => warn!(tag = %tag, error = %e, "release already exists, continuing"),
                Err(e) => return Err(e),
            }

            released.push(ReleasedPackage {
                path: change.path.clone(),
                target: change.release_target.clone(),
                version: change.new_version.to_string(),
            });
        }

        Ok(released)
    }
}
