//! Side-effecting actions, one per transition

use chrono::NaiveDate;
use liftoff_adapters::repo_relative;
use liftoff_changelog::file::prepend_entry;
use liftoff_core::config::Config;
use liftoff_core::error::Result;
use liftoff_core::types::{package_name, PackageChanges, ReleaseOutput, ReleasedPackage};
use liftoff_github::naming::fingerprint_marker;
use liftoff_github::{FileEdit, ReleasePrRequest, SourceControl};
use liftoff_strategies::SemVerStrategy;
use tracing::{info, instrument, warn};

use crate::plan::ReleasePlan;
use crate::snapshot::Snapshot;

/// Everything an action may use
pub(crate) struct ActionContext<'a, S: SourceControl + ?Sized> {
    pub gateway: &'a S,
    pub config: &'a Config,
    pub snapshot: &'a Snapshot,
    pub plan: &'a ReleasePlan,
    pub today: NaiveDate,
}

/// Flip the PR of a deleted release branch to `released`
pub(crate) async fn settle_deleted_branch<S>(
    ctx: &ActionContext<'_, S>,
    number: Option<u64>,
) -> Result<ReleaseOutput>
where
    S: SourceControl + ?Sized,
{
    let labels = &ctx.config.labels;
    match (number, ctx.snapshot.pull_request.as_ref()) {
        (Some(number), Some(pr)) if pr.has_label(&labels.pending) => {
            ctx.gateway
                .mark_released(number, &labels.pending, &labels.released)
                .await?;
            info!(number, "settled labels of deleted release branch");
        }
        _ => info!("deleted release branch already settled"),
    }
    Ok(ReleaseOutput::default())
}

/// Explain why a prerelease request was ignored
pub(crate) async fn explain_disabled_prerelease<S>(
    ctx: &ActionContext<'_, S>,
    number: u64,
) -> Result<ReleaseOutput>
where
    S: SourceControl + ?Sized,
{
    let body = format!(
        "The `{}` label requests a prerelease, but prereleases are not enabled for the `{}` release target. No prerelease was cut.",
        ctx.config.prerelease.label, ctx.snapshot.target
    );
    ctx.gateway.comment(number, &body).await?;
    Ok(ReleaseOutput::default())
}

/// Cut `-rc.N` releases for every bumped package from the PR head
#[instrument(skip(ctx))]
pub(crate) async fn cut_prerelease<S>(
    ctx: &ActionContext<'_, S>,
    number: u64,
    head_sha: &str,
) -> Result<ReleaseOutput>
where
    S: SourceControl + ?Sized,
{
    let strategy = SemVerStrategy::new();
    let mut candidates = Vec::new();

    for change in ctx.plan.bumped() {
        let base = &change.new_version;
        let used = ctx
            .gateway
            .latest_prerelease_ordinal(&change.path, base)
            .await?
            .unwrap_or(0);
        let version = strategy.with_prerelease(base, used + 1)?;
        info!(path = %change.path, version = %version, "prerelease candidate");
        candidates.push(PackageChanges {
            new_version: version,
            ..change.clone()
        });
    }

    let released = ctx.gateway.cut_release(&candidates, true, head_sha).await?;
    ctx.gateway
        .comment(number, &prerelease_comment(&released))
        .await?;
    Ok(ReleaseOutput::released(released, true))
}

/// Tag and release the versions a landed release PR recorded
#[instrument(skip(ctx))]
pub(crate) async fn cut_merged_release<S>(
    ctx: &ActionContext<'_, S>,
    number: Option<u64>,
    commitish: &str,
) -> Result<ReleaseOutput>
where
    S: SourceControl + ?Sized,
{
    let snapshot = ctx.snapshot;
    let mut changes = Vec::with_capacity(snapshot.unreleased.len());

    for (path, version) in &snapshot.unreleased {
        let planned = ctx.plan.get(path);
        let section = match ctx.gateway.changelog_section(path, version).await {
            Ok(section) => section,
            Err(e) => {
                warn!(path = %path, error = %e, "could not read changelog section, using generated notes");
                None
            }
        };
        let changelog = section
            .or_else(|| planned.map(|c| c.changelog.clone()))
            .unwrap_or_default();

        changes.push(PackageChanges {
            path: path.clone(),
            name: package_name(path, &snapshot.context.repo),
            current_version: None,
            new_version: version.clone(),
            commits: planned.map(|c| c.commits.clone()).unwrap_or_default(),
            changelog,
            release_target: snapshot.target.clone(),
        });
    }

    let released = ctx.gateway.cut_release(&changes, false, commitish).await?;

    if let Some(number) = number {
        let labels = &ctx.config.labels;
        ctx.gateway
            .mark_released(number, &labels.pending, &labels.released)
            .await?;
    }
    Ok(ReleaseOutput::released(released, false))
}

/// Open or update the release PR with the manifest (and, unless
/// `manifest_only`, version carriers and changelog files)
#[instrument(skip(ctx))]
pub(crate) async fn upsert_release_pr<S>(
    ctx: &ActionContext<'_, S>,
    manifest_only: bool,
) -> Result<ReleaseOutput>
where
    S: SourceControl + ?Sized,
{
    let edits = release_edits(ctx, manifest_only).await?;
    let title = ctx.plan.title();
    let fingerprint = ctx.plan.fingerprint(&ctx.snapshot.base_sha);

    let request = ReleasePrRequest {
        target: ctx.snapshot.target.clone(),
        branch: ctx.config.release.release_branch(),
        base: ctx.snapshot.default_branch.clone(),
        base_sha: ctx.snapshot.base_sha.clone(),
        commit_message: title.clone(),
        title,
        body: pr_body(ctx.plan, &fingerprint),
        labels: vec![
            ctx.config.labels.pending.clone(),
            ctx.config.labels.target_label(&ctx.snapshot.target),
        ],
        edits,
    };

    let pr = ctx.gateway.open_or_update_release_pr(&request).await?;
    info!(number = pr.number, title = %pr.title, "release PR ready");
    Ok(ReleaseOutput::pull_request(pr.number))
}

async fn release_edits<S>(ctx: &ActionContext<'_, S>, manifest_only: bool) -> Result<Vec<FileEdit>>
where
    S: SourceControl + ?Sized,
{
    let mut manifest = ctx.snapshot.manifest.clone();
    for change in &ctx.plan.changes {
        manifest.record(&change.path, &ctx.plan.target, &change.new_version)?;
    }

    let mut edits = vec![FileEdit::new(
        ctx.config.manifest.path.clone(),
        manifest.to_json(ctx.config.manifest.indent)?,
    )];
    if manifest_only {
        return Ok(edits);
    }

    for change in ctx.plan.bumped() {
        edits.push(
            ctx.gateway
                .write_package_version(&change.path, &change.new_version)
                .await?,
        );

        let file = repo_relative(&change.path, &ctx.config.changelog.file);
        let existing = ctx.gateway.read_file(&file).await?.unwrap_or_default();
        let content = prepend_entry(
            &existing,
            &change.new_version.to_string(),
            ctx.today,
            &change.changelog,
        );
        edits.push(FileEdit::new(file, content));
    }
    Ok(edits)
}

/// Markdown body of a release PR
pub fn pr_body(plan: &ReleasePlan, fingerprint: &str) -> String {
    let mut body = format!("## Release `{}`\n\n", plan.target);
    if plan.is_catch_up_only() {
        body.push_str("Moves the release target up to versions already assigned elsewhere.\n\n");
    }

    for change in &plan.changes {
        let from = change
            .current_version
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "none".to_string());
        body.push_str(&format!(
            "### `{}`: {} → {}\n\n",
            change.path, from, change.new_version
        ));
        if change.is_catch_up() {
            body.push_str("No new commits.\n\n");
        } else {
            body.push_str(change.changelog.trim());
            body.push_str("\n\n");
        }
    }

    body.push_str(&fingerprint_marker(fingerprint));
    body.push('\n');
    body
}

/// Summary comment after cutting prereleases
pub fn prerelease_comment(released: &[ReleasedPackage]) -> String {
    let mut body = String::from("Prerelease published:\n\n");
    for package in released {
        body.push_str(&format!("- `{}` {}\n", package.path, package.version));
    }
    body
}
