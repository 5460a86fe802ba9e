//! Pull requests, release branches, labels, and comments

use liftoff_core::error::{RemoteError, Result};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::gateway::{encode_path, encode_segment, GitHubGateway};
use crate::types::{PullRequest, PullRequestState, ReleasePrRequest};

#[derive(Debug, Deserialize)]
struct ApiPull {
    number: u64,
    title: String,
    #[serde(default)]
    body: Option<String>,
    state: String,
    #[serde(default)]
    merged_at: Option<String>,
    #[serde(default)]
    labels: Vec<ApiLabel>,
    head: ApiBranch,
    base: ApiBranch,
    #[serde(default)]
    merge_commit_sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ApiBranch {
    #[serde(rename = "ref")]
    name: String,
    sha: String,
}

impl From<ApiPull> for PullRequest {
    fn from(api: ApiPull) -> Self {
        let state = if api.merged_at.is_some() {
            PullRequestState::Merged
        } else if api.state == "open" {
            PullRequestState::Open
        } else {
            PullRequestState::Closed
        };
        Self {
            number: api.number,
            title: api.title,
            body: api.body.unwrap_or_default(),
            labels: api.labels.into_iter().map(|l| l.name).collect(),
            head_ref: api.head.name,
            base_ref: api.base.name,
            head_sha: api.head.sha,
            merge_commit_sha: api.merge_commit_sha.filter(|_| state == PullRequestState::Merged),
            state,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiGitCommit {
    tree: ApiSha,
}

#[derive(Debug, Deserialize)]
struct ApiSha {
    sha: String,
}

impl GitHubGateway {
    #[instrument(skip(self))]
    pub(crate) async fn fetch_pull_request(&self, number: u64) -> Result<Option<PullRequest>> {
        let path = self.client.repo_path(&format!("/pulls/{}", number));
        let pull: Option<ApiPull> = self.client.get_optional(&path).await?;
        if pull.is_none() {
            warn!(number, "pull request not found");
        }
        Ok(pull.map(Into::into))
    }

    /// Merged PR into the default branch that produced `sha`
    #[instrument(skip(self))]
    pub(crate) async fn fetch_pull_request_for_commit(
        &self,
        sha: &str,
    ) -> Result<Option<PullRequest>> {
        let base = self.resolve_default_branch().await?;
        let path = self.client.repo_path(&format!("/commits/{}/pulls", sha));
        let pulls: Vec<ApiPull> = match self.client.get(&path).await {
            Ok(pulls) => pulls,
            Err(e) if e.is_not_found() => {
                warn!(sha, "no pull request lookup for commit");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let found = pulls
            .into_iter()
            .map(PullRequest::from)
            .find(|pr| pr.is_merged() && pr.base_ref == base);
        debug!(sha, number = ?found.as_ref().map(|p| p.number), "resolved pull request for commit");
        Ok(found)
    }

    /// Open release PR for a target: labels first, then exact title
    #[instrument(skip(self))]
    pub(crate) async fn search_release_pr(
        &self,
        target: &str,
        title: Option<&str>,
    ) -> Result<Option<PullRequest>> {
        let base = self.resolve_default_branch().await?;
        let path = self.client.repo_path(&format!(
            "/pulls?state=open&base={}&per_page=100",
            encode_segment(&base)
        ));
        let pulls: Vec<ApiPull> = self.client.get_all(&path, None).await?;
        let pulls: Vec<PullRequest> = pulls.into_iter().map(Into::into).collect();

        let pending = &self.settings.labels.pending;
        let target_label = self.settings.labels.target_label(target);
        if let Some(pr) = pulls
            .iter()
            .find(|pr| pr.has_label(pending) && pr.has_label(&target_label))
        {
            return Ok(Some(pr.clone()));
        }

        let by_title = title.and_then(|t| pulls.into_iter().find(|pr| pr.title == t));
        if let Some(pr) = &by_title {
            info!(number = pr.number, "rediscovered release PR by title");
        }
        Ok(by_title)
    }

    /// Build one commit on `base_sha` carrying every edit in the request
    async fn create_release_commit(&self, request: &ReleasePrRequest) -> Result<String> {
        let base: ApiGitCommit = self
            .client
            .get(&self.client.repo_path(&format!("/git/commits/{}", request.base_sha)))
            .await?;

        let entries: Vec<_> = request
            .edits
            .iter()
            .map(|edit| {
                json!({
                    "path": edit.path,
                    "mode": "100644",
                    "type": "blob",
                    "content": edit.content,
                })
            })
            .collect();
        let tree: ApiSha = self
            .client
            .send(
                Method::POST,
                &self.client.repo_path("/git/trees"),
                &json!({ "base_tree": base.tree.sha, "tree": entries }),
            )
            .await?;

        let commit: ApiSha = self
            .client
            .send(
                Method::POST,
                &self.client.repo_path("/git/commits"),
                &json!({
                    "message": request.commit_message,
                    "tree": tree.sha,
                    "parents": [request.base_sha],
                }),
            )
            .await?;

        debug!(sha = %commit.sha, files = request.edits.len(), "created release commit");
        Ok(commit.sha)
    }

    /// Point `branch` at `sha`, replacing whatever history it had
    async fn force_branch(&self, branch: &str, sha: &str) -> Result<()> {
        let update_path = self
            .client
            .repo_path(&format!("/git/refs/heads/{}", encode_path(branch)));
        let update = json!({ "sha": sha, "force": true });

        if self.find_branch_head(branch).await?.is_some() {
            self.client
                .send_no_content(Method::PATCH, &update_path, Some(&update))
                .await?;
            info!(branch, sha, "force-updated release branch");
            return Ok(());
        }

        let create = json!({ "ref": format!("refs/heads/{}", branch), "sha": sha });
        match self
            .client
            .send_no_content(Method::POST, &self.client.repo_path("/git/refs"), Some(&create))
            .await
        {
            Ok(()) => {
                info!(branch, sha, "created release branch");
                Ok(())
            }
            Err(e) if e.is_conflict() => {
                warn!(branch, "release branch appeared concurrently, force-updating");
                self.client
                    .send_no_content(Method::PATCH, &update_path, Some(&update))
                    .await
            }
            Err(e) => Err(e),
        }
    }

    async fn update_pull(&self, number: u64, request: &ReleasePrRequest) -> Result<PullRequest> {
        let pull: ApiPull = self
            .client
            .send(
                Method::PATCH,
                &self.client.repo_path(&format!("/pulls/{}", number)),
                &json!({ "title": request.title, "body": request.body }),
            )
            .await?;
        info!(number, "updated release PR");
        Ok(pull.into())
    }

    async fn create_pull(&self, branch: &str, request: &ReleasePrRequest) -> Result<PullRequest> {
        let body = json!({
            "title": request.title,
            "body": request.body,
            "head": branch,
            "base": request.base,
        });
        let result: Result<ApiPull> = self
            .client
            .send(Method::POST, &self.client.repo_path("/pulls"), &body)
            .await;

        match result {
            Ok(pull) => {
                info!(number = pull.number, branch, "opened release PR");
                Ok(pull.into())
            }
            Err(e) if e.is_conflict() => {
                warn!(branch, "release PR already exists for branch, updating it");
                let path = self.client.repo_path(&format!(
                    "/pulls?state=open&head={}:{}",
                    encode_segment(self.client.owner()),
                    encode_segment(branch)
                ));
                let open: Vec<ApiPull> = self.client.get(&path).await?;
                let existing = open.into_iter().next().ok_or_else(|| {
                    RemoteError::NotFound(format!("open pull request for branch '{}'", branch))
                })?;
                self.update_pull(existing.number, request).await
            }
            Err(e) => Err(e),
        }
    }

    #[instrument(skip(self, request), fields(target = %request.target, edits = request.edits.len()))]
    pub(crate) async fn upsert_release_pr(&self, request: &ReleasePrRequest) -> Result<PullRequest> {
        let existing = self
            .search_release_pr(&request.target, Some(&request.title))
            .await?;
        let branch = existing
            .as_ref()
            .map(|pr| pr.head_ref.clone())
            .unwrap_or_else(|| request.branch.clone());

        let sha = self.create_release_commit(request).await?;
        self.force_branch(&branch, &sha).await?;

        let mut pr = match existing {
            Some(pr) => self.update_pull(pr.number, request).await?,
            None => self.create_pull(&branch, request).await?,
        };

        let missing: Vec<String> = request
            .labels
            .iter()
            .filter(|l| !pr.has_label(l))
            .cloned()
            .collect();
        self.post_labels(pr.number, &missing).await?;
        pr.labels.extend(missing);
        pr.head_sha = sha;
        Ok(pr)
    }

    pub(crate) async fn post_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        if labels.is_empty() {
            return Ok(());
        }
        self.client
            .send_no_content(
                Method::POST,
                &self.client.repo_path(&format!("/issues/{}/labels", number)),
                Some(&json!({ "labels": labels })),
            )
            .await?;
        debug!(number, ?labels, "added labels");
        Ok(())
    }

    pub(crate) async fn delete_label(&self, number: u64, label: &str) -> Result<()> {
        let path = self.client.repo_path(&format!(
            "/issues/{}/labels/{}",
            number,
            encode_segment(label)
        ));
        match self
            .client
            .send_no_content::<()>(Method::DELETE, &path, None)
            .await
        {
            Ok(()) => {
                debug!(number, label, "removed label");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn post_comment(&self, number: u64, body: &str) -> Result<()> {
        self.client
            .send_no_content(
                Method::POST,
                &self.client.repo_path(&format!("/issues/{}/comments", number)),
                Some(&json!({ "body": body })),
            )
            .await?;
        info!(number, "posted comment");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::test_support;
    use crate::traits::SourceControl;
    use crate::types::FileEdit;
    use serde_json::Value;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn pull_json(number: u64, title: &str, labels: &[&str], merged: bool) -> Value {
        let state = if merged { "closed" } else { "open" };
        let merged_at = merged.then_some("2024-05-01T00:00:00Z");
        let labels: Vec<Value> = labels.iter().map(|l| json!({"name": l})).collect();
        json!({
            "number": number,
            "title": title,
            "body": "",
            "state": state,
            "merged_at": merged_at,
            "labels": labels,
            "head": {"ref": "liftoff/release/main", "sha": "head1"},
            "base": {"ref": "main", "sha": "base1"},
            "merge_commit_sha": "merge1",
        })
    }

    fn request() -> ReleasePrRequest {
        ReleasePrRequest {
            target: "main".to_string(),
            branch: "liftoff/release/main".to_string(),
            base: "main".to_string(),
            base_sha: "base1".to_string(),
            title: "chore: release pkg/a@1.1.0".to_string(),
            body: "body".to_string(),
            commit_message: "chore: release pkg/a@1.1.0".to_string(),
            labels: vec!["release-me".to_string(), "release-target:main".to_string()],
            edits: vec![FileEdit::new(
                "release-manifest.json",
                "{\"pkg/a\":{\"latest\":\"1.1.0\",\"main\":\"1.1.0\"}}\n",
            )],
        }
    }

    async fn mount_commit_plumbing(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/repos/acme/mono/git/commits/base1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"sha": "base1", "tree": {"sha": "tree0"}})),
            )
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/mono/git/trees"))
            .and(body_partial_json(json!({
                "base_tree": "tree0",
                "tree": [{"path": "release-manifest.json", "mode": "100644", "type": "blob"}]
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sha": "tree1"})))
            .expect(1)
            .mount(server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/mono/git/commits"))
            .and(body_partial_json(json!({"tree": "tree1", "parents": ["base1"]})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"sha": "commit1"})))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_opens_new_release_pr() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/mono/pulls"))
            .and(query_param("base", "main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;
        mount_commit_plumbing(&server).await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/mono/git/ref/heads/liftoff/release/main"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"message": "Not Found"})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/mono/git/refs"))
            .and(body_partial_json(json!({"ref": "refs/heads/liftoff/release/main", "sha": "commit1"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/mono/pulls"))
            .and(body_partial_json(json!({"head": "liftoff/release/main", "base": "main"})))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(pull_json(5, "chore: release pkg/a@1.1.0", &[], false)),
            )
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/mono/issues/5/labels"))
            .and(body_partial_json(json!({"labels": ["release-me", "release-target:main"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = test_support::gateway(&server).await;
        let pr = gateway.open_or_update_release_pr(&request()).await.unwrap();

        assert_eq!(pr.number, 5);
        assert!(pr.is_open());
        assert!(pr.has_label("release-me"));
        assert!(pr.has_label("release-target:main"));
        assert_eq!(pr.head_sha, "commit1");
    }

    #[tokio::test]
    async fn test_force_updates_existing_release_pr() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/mono/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                pull_json(3, "feat: unrelated", &[], false),
                pull_json(7, "chore: release pkg/a@1.0.1", &["release-me", "release-target:main"], false),
            ])))
            .mount(&server)
            .await;
        mount_commit_plumbing(&server).await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/mono/git/ref/heads/liftoff/release/main"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"object": {"sha": "old"}})))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/mono/git/refs/heads/liftoff/release/main"))
            .and(body_partial_json(json!({"sha": "commit1", "force": true})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/repos/acme/mono/pulls/7"))
            .and(body_partial_json(json!({"title": "chore: release pkg/a@1.1.0"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(pull_json(
                7,
                "chore: release pkg/a@1.1.0",
                &["release-me", "release-target:main"],
                false,
            )))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/mono/pulls"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let gateway = test_support::gateway(&server).await;
        let pr = gateway.open_or_update_release_pr(&request()).await.unwrap();
        assert_eq!(pr.number, 7);
        assert_eq!(pr.title, "chore: release pkg/a@1.1.0");
    }

    #[tokio::test]
    async fn test_find_release_pr_by_title() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/mono/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                pull_json(11, "chore: release pkg/a@1.1.0", &[], false),
            ])))
            .mount(&server)
            .await;

        let gateway = test_support::gateway(&server).await;
        let found = gateway
            .find_release_pr("main", Some("chore: release pkg/a@1.1.0"))
            .await
            .unwrap();
        assert_eq!(found.map(|p| p.number), Some(11));
        assert!(gateway.find_release_pr("main", None).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pull_request_for_commit_prefers_merged() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/repos/acme/mono/commits/merge1/pulls"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                pull_json(2, "wip", &[], false),
                pull_json(8, "chore: release pkg/a@1.1.0", &["release-me"], true),
            ])))
            .mount(&server)
            .await;

        let gateway = test_support::gateway(&server).await;
        let pr = gateway.pull_request_for_commit("merge1").await.unwrap().unwrap();
        assert_eq!(pr.number, 8);
        assert!(pr.is_merged());
        assert_eq!(pr.merge_commit_sha.as_deref(), Some("merge1"));
    }

    #[tokio::test]
    async fn test_mark_released_tolerates_label_removal_failure() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/repos/acme/mono/issues/8/labels/release-me"))
            .respond_with(ResponseTemplate::new(500).set_body_json(json!({"message": "boom"})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/repos/acme/mono/issues/8/labels"))
            .and(body_partial_json(json!({"labels": ["released"]})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let gateway = test_support::gateway(&server).await;
        gateway.mark_released(8, "release-me", "released").await.unwrap();
    }
}
