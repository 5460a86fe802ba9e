//! Triggering-event context

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ConfigError, Result};

/// Read-only description of the event that triggered this run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseContext {
    /// Whether the run was triggered by a pull request event
    pub is_pull_request: bool,
    /// Pull request number, for pull request events
    pub pull_request_number: Option<u64>,
    /// Base branch (the PR base, or the pushed branch)
    pub base_ref: String,
    /// Head branch (the PR head, or the pushed branch)
    pub head_ref: String,
    /// Head commit
    pub head_sha: String,
    /// Repository owner
    pub owner: String,
    /// Repository name
    pub repo: String,
}

#[derive(Debug, Deserialize)]
struct EventPayload {
    #[serde(default)]
    pull_request: Option<PullRequestPayload>,
    #[serde(default)]
    after: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PullRequestPayload {
    number: u64,
    head: RefPayload,
    base: RefPayload,
}

#[derive(Debug, Deserialize)]
struct RefPayload {
    #[serde(rename = "ref")]
    name: String,
    sha: String,
}

impl ReleaseContext {
    /// Build the context from GitHub Actions environment variables
    pub fn from_env() -> Result<Self> {
        let event = match std::env::var("GITHUB_EVENT_PATH") {
            Ok(path) if !path.is_empty() => Some(std::fs::read_to_string(path)?),
            _ => None,
        };
        Self::from_parts(|key| std::env::var(key).ok(), event.as_deref())
    }

    /// Build the context from an environment lookup and an optional event payload
    pub fn from_parts<F>(var: F, event: Option<&str>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let repository = var("GITHUB_REPOSITORY")
            .ok_or_else(|| ConfigError::MissingField("GITHUB_REPOSITORY".to_string()))?;
        let (owner, repo) = parse_repository(&repository)?;

        let payload: Option<EventPayload> = match event {
            Some(raw) => Some(
                serde_json::from_str(raw)
                    .map_err(|e| ConfigError::ParseError(format!("event payload: {}", e)))?,
            ),
            None => None,
        };

        let ref_name = var("GITHUB_REF_NAME").unwrap_or_default();
        let sha = var("GITHUB_SHA").unwrap_or_default();

        let context = match payload.as_ref().and_then(|p| p.pull_request.as_ref()) {
            Some(pr) => Self {
                is_pull_request: true,
                pull_request_number: Some(pr.number),
                base_ref: pr.base.name.clone(),
                head_ref: pr.head.name.clone(),
                head_sha: pr.head.sha.clone(),
                owner,
                repo,
            },
            None => {
                let head_sha = payload
                    .as_ref()
                    .and_then(|p| p.after.clone())
                    .filter(|s| !s.is_empty())
                    .unwrap_or(sha);
                Self {
                    is_pull_request: false,
                    pull_request_number: None,
                    base_ref: ref_name.clone(),
                    head_ref: ref_name,
                    head_sha,
                    owner,
                    repo,
                }
            }
        };

        debug!(
            owner = %context.owner,
            repo = %context.repo,
            pull_request = ?context.pull_request_number,
            head_ref = %context.head_ref,
            "release context resolved"
        );
        Ok(context)
    }

    /// `owner/repo`
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Split `owner/repo`
pub fn parse_repository(repository: &str) -> Result<(String, String)> {
    match repository.split_once('/') {
        Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
            Ok((owner.to_string(), repo.to_string()))
        }
        _ => Err(ConfigError::InvalidValue {
            field: "repository".to_string(),
            message: format!("expected owner/repo, got '{}'", repository),
        }
        .into()),
    }
}
