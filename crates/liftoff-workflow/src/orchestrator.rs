//! Release orchestration

use chrono::{NaiveDate, Utc};
use liftoff_core::config::{validate_config, Config};
use liftoff_core::error::Result;
use liftoff_core::{ReleaseContext, ReleaseOutput};
use liftoff_github::SourceControl;
use serde::Serialize;
use tracing::{info, instrument};

use crate::actions::{self, ActionContext};
use crate::plan::{PlanInputs, ReleasePlan};
use crate::rules::{decide, RuleInput, Transition};
use crate::snapshot::Snapshot;

/// Snapshot, plan, and the transition they select
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Remote state read at the start of the run
    pub snapshot: Snapshot,
    /// Computed changes for the target
    pub plan: ReleasePlan,
    /// Selected transition
    pub transition: Transition,
}

/// Result of a completed run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Transition that was executed
    pub transition: Transition,
    /// Outputs for the calling workflow
    pub output: ReleaseOutput,
}

/// Drives one run of the release lifecycle against a [`SourceControl`]
pub struct Orchestrator<'a, S: SourceControl + ?Sized> {
    gateway: &'a S,
    config: &'a Config,
    today: NaiveDate,
    repo_url: Option<String>,
}

impl<'a, S: SourceControl + ?Sized> Orchestrator<'a, S> {
    /// Create a new orchestrator
    pub fn new(gateway: &'a S, config: &'a Config) -> Self {
        Self {
            gateway,
            config,
            today: Utc::now().date_naive(),
            repo_url: None,
        }
    }

    /// Date stamped on changelog entries
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Base URL for commit links in changelogs
    pub fn with_repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = Some(url.into());
        self
    }

    /// Read the remote state and decide, without writing anything
    #[instrument(skip_all, fields(repo = %context.full_name(), target = %self.config.release.target))]
    pub async fn evaluate(&self, context: ReleaseContext) -> Result<Evaluation> {
        validate_config(self.config)?;

        let repo_url = self
            .repo_url
            .clone()
            .unwrap_or_else(|| format!("https://github.com/{}", context.full_name()));
        let mut snapshot = Snapshot::capture(self.gateway, self.config, context).await?;

        let plan = ReleasePlan::compute(PlanInputs {
            manifest: &snapshot.manifest,
            commits: &snapshot.commits,
            target: &snapshot.target,
            repo: &snapshot.context.repo,
            repo_url: Some(repo_url),
            changelog: &self.config.changelog,
        })?;
        snapshot
            .record_prereleases(self.gateway, &plan, self.config)
            .await?;

        let transition = decide(&RuleInput {
            snapshot: &snapshot,
            plan: &plan,
            config: self.config,
        });
        info!(transition = %transition, packages = plan.changes.len(), "selected transition");

        Ok(Evaluation {
            snapshot,
            plan,
            transition,
        })
    }

    /// Evaluate and execute the selected transition
    pub async fn run(&self, context: ReleaseContext) -> Result<RunOutcome> {
        let evaluation = self.evaluate(context).await?;
        let output = self.execute(&evaluation).await?;

        info!(
            transition = %evaluation.transition,
            released = output.released,
            pull_request = ?output.pull_request,
            "release run complete"
        );
        Ok(RunOutcome {
            transition: evaluation.transition,
            output,
        })
    }

    #[instrument(skip_all, fields(transition = %evaluation.transition))]
    async fn execute(&self, evaluation: &Evaluation) -> Result<ReleaseOutput> {
        let ctx = ActionContext {
            gateway: self.gateway,
            config: self.config,
            snapshot: &evaluation.snapshot,
            plan: &evaluation.plan,
            today: self.today,
        };

        match &evaluation.transition {
            Transition::SettleDeletedBranch { number, settle: true } => {
                actions::settle_deleted_branch(&ctx, *number).await
            }
            Transition::SkipDisabledPrerelease { number } => {
                actions::explain_disabled_prerelease(&ctx, *number).await
            }
            Transition::Prerelease { number, head_sha } => {
                actions::cut_prerelease(&ctx, *number, head_sha).await
            }
            Transition::MergedRelease { number, commitish } => {
                actions::cut_merged_release(&ctx, *number, commitish).await
            }
            Transition::VersionBumpOnly => actions::upsert_release_pr(&ctx, true).await,
            Transition::OpenReleasePr => actions::upsert_release_pr(&ctx, false).await,
            skip => {
                info!(transition = %skip, "nothing to do");
                Ok(ReleaseOutput::default())
            }
        }
    }
}
