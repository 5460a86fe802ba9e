//! The lifecycle transition table
//!
//! Rules are evaluated in order and the first match wins. Each rule is a pure
//! predicate over the snapshot and the plan; the matched [`Transition`] names
//! the single write path the run will take.

use liftoff_core::config::Config;
use liftoff_github::naming::extract_fingerprint;
use liftoff_github::PullRequest;
use serde::Serialize;
use tracing::debug;

use crate::plan::ReleasePlan;
use crate::snapshot::Snapshot;

/// The one thing a run does
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transition {
    /// Release branch deleted after its PR closed: settle the PR's labels and
    /// stop. `settle` is false for a PR closed without merging and while
    /// versions are still waiting to be released.
    SettleDeletedBranch { number: Option<u64>, settle: bool },
    /// PR already released
    SkipReleased,
    /// Prerelease requested while prereleases are disabled
    SkipDisabledPrerelease { number: u64 },
    /// Every planned package already has a prerelease at the PR head
    SkipPrereleased { number: u64 },
    /// Cut `-rc.N` releases from the PR head
    Prerelease { number: u64, head_sha: String },
    /// Event that cannot lead to a release (unmerged PR, push to another branch)
    SkipUnmergedEvent,
    /// Nothing to release and nothing to fast-forward
    SkipNothingToRelease,
    /// A release PR landed: tag and release it
    MergedRelease {
        number: Option<u64>,
        commitish: String,
    },
    /// Standing release PR already matches the plan
    SkipUpToDate { number: u64 },
    /// Advance lagging targets in the manifest only
    VersionBumpOnly,
    /// Open or update the standing release PR
    OpenReleasePr,
}

impl Transition {
    /// Stable name used in logs and plan output
    pub fn name(&self) -> &'static str {
        match self {
            Self::SettleDeletedBranch { .. } => "settle-deleted-branch",
            Self::SkipReleased => "skip-released",
            Self::SkipDisabledPrerelease { .. } => "skip-disabled-prerelease",
            Self::SkipPrereleased { .. } => "skip-prereleased",
            Self::Prerelease { .. } => "prerelease",
            Self::SkipUnmergedEvent => "skip-unmerged-event",
            Self::SkipNothingToRelease => "skip-nothing-to-release",
            Self::MergedRelease { .. } => "merged-release",
            Self::SkipUpToDate { .. } => "skip-up-to-date",
            Self::VersionBumpOnly => "version-bump-only",
            Self::OpenReleasePr => "open-release-pr",
        }
    }

    /// Whether the transition performs no writes
    pub fn is_skip(&self) -> bool {
        matches!(
            self,
            Self::SkipReleased
                | Self::SkipPrereleased { .. }
                | Self::SkipUnmergedEvent
                | Self::SkipNothingToRelease
                | Self::SkipUpToDate { .. }
                | Self::SettleDeletedBranch { settle: false, .. }
        )
    }
}

impl std::fmt::Display for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// What a rule sees
pub struct RuleInput<'a> {
    pub snapshot: &'a Snapshot,
    pub plan: &'a ReleasePlan,
    pub config: &'a Config,
}

/// One guarded transition
pub struct Rule {
    /// Rule name
    pub name: &'static str,
    /// Returns the transition when the rule applies
    pub guard: fn(&RuleInput<'_>) -> Option<Transition>,
}

/// Rules in priority order
pub const RULES: &[Rule] = &[
    Rule { name: "deleted-release-branch", guard: deleted_release_branch },
    Rule { name: "already-released", guard: already_released },
    Rule { name: "prerelease-disabled", guard: prerelease_disabled },
    Rule { name: "already-prereleased", guard: already_prereleased },
    Rule { name: "prerelease", guard: prerelease },
    Rule { name: "unmerged-event", guard: unmerged_event },
    Rule { name: "nothing-to-release", guard: nothing_to_release },
    Rule { name: "merged-release", guard: merged_release },
    Rule { name: "up-to-date", guard: up_to_date },
    Rule { name: "catch-up-only", guard: catch_up_only },
];

/// First matching transition; the standing release PR is the fallback
pub fn decide(input: &RuleInput<'_>) -> Transition {
    for rule in RULES {
        if let Some(transition) = (rule.guard)(input) {
            debug!(rule = rule.name, transition = %transition, "rule matched");
            return transition;
        }
    }
    debug!("no rule matched, defaulting to release PR");
    Transition::OpenReleasePr
}

/// Open triggering PR that carries the prerelease label
fn prerelease_pr<'a>(input: &RuleInput<'a>) -> Option<&'a PullRequest> {
    let pr = input.snapshot.trigger_pr()?;
    (pr.is_open() && pr.has_label(&input.config.prerelease.label)).then_some(pr)
}

fn deleted_release_branch(input: &RuleInput<'_>) -> Option<Transition> {
    if !input.snapshot.is_deleted_release_branch() {
        return None;
    }
    let pr = input.snapshot.trigger_pr();
    let merged = pr.is_some_and(PullRequest::is_merged);
    Some(Transition::SettleDeletedBranch {
        number: pr.map(|pr| pr.number),
        settle: merged && input.snapshot.unreleased.is_empty(),
    })
}

fn already_released(input: &RuleInput<'_>) -> Option<Transition> {
    let pr = input.snapshot.pull_request.as_ref()?;
    pr.has_label(&input.config.labels.released)
        .then_some(Transition::SkipReleased)
}

fn prerelease_disabled(input: &RuleInput<'_>) -> Option<Transition> {
    let pr = prerelease_pr(input)?;
    (!input.config.prerelease.enabled)
        .then_some(Transition::SkipDisabledPrerelease { number: pr.number })
}

fn already_prereleased(input: &RuleInput<'_>) -> Option<Transition> {
    let pr = prerelease_pr(input)?;
    let mut bumped = input.plan.bumped().peekable();
    bumped.peek()?;
    bumped
        .all(|change| input.snapshot.prereleased.contains_key(&change.path))
        .then_some(Transition::SkipPrereleased { number: pr.number })
}

fn prerelease(input: &RuleInput<'_>) -> Option<Transition> {
    let pr = prerelease_pr(input)?;
    if !input.config.prerelease.enabled || input.plan.bumped().next().is_none() {
        return None;
    }
    Some(Transition::Prerelease {
        number: pr.number,
        head_sha: pr.head_sha.clone(),
    })
}

fn unmerged_event(input: &RuleInput<'_>) -> Option<Transition> {
    let snapshot = input.snapshot;
    let unmerged_pr = snapshot.context.is_pull_request
        && snapshot.pull_request.as_ref().map_or(true, |pr| !pr.is_merged());
    (unmerged_pr || snapshot.is_foreign_push()).then_some(Transition::SkipUnmergedEvent)
}

fn nothing_to_release(input: &RuleInput<'_>) -> Option<Transition> {
    let landed = input.snapshot.is_merged_release(input.config) && !input.snapshot.unreleased.is_empty();
    (input.plan.is_empty() && !landed).then_some(Transition::SkipNothingToRelease)
}

fn merged_release(input: &RuleInput<'_>) -> Option<Transition> {
    let snapshot = input.snapshot;
    if !snapshot.is_merged_release(input.config) {
        return None;
    }
    if snapshot.unreleased.is_empty() {
        return Some(Transition::SkipReleased);
    }

    let pr = snapshot.pull_request.as_ref();
    let commitish = pr
        .and_then(|pr| pr.merge_commit_sha.clone())
        .unwrap_or_else(|| snapshot.base_sha.clone());
    Some(Transition::MergedRelease {
        number: pr.map(|pr| pr.number),
        commitish,
    })
}

fn up_to_date(input: &RuleInput<'_>) -> Option<Transition> {
    let pr = input.snapshot.standing_pr.as_ref()?;
    let recorded = extract_fingerprint(&pr.body)?;
    (recorded == input.plan.fingerprint(&input.snapshot.base_sha))
        .then_some(Transition::SkipUpToDate { number: pr.number })
}

fn catch_up_only(input: &RuleInput<'_>) -> Option<Transition> {
    input
        .plan
        .is_catch_up_only()
        .then_some(Transition::VersionBumpOnly)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanInputs;
    use liftoff_core::config::ChangelogConfig;
    use liftoff_core::{PackageManifest, ReleaseContext};
    use liftoff_github::naming::fingerprint_marker;
    use liftoff_github::{PullRequestState, RemoteCommit};
    use semver::Version;
    use std::collections::BTreeMap;

    fn context(is_pull_request: bool) -> ReleaseContext {
        ReleaseContext {
            is_pull_request,
            pull_request_number: is_pull_request.then_some(5),
            base_ref: "main".to_string(),
            head_ref: if is_pull_request { "feature/x" } else { "main" }.to_string(),
            head_sha: "head1".to_string(),
            owner: "acme".to_string(),
            repo: "mono".to_string(),
        }
    }

    fn pr(state: PullRequestState, labels: &[&str]) -> PullRequest {
        PullRequest {
            number: 5,
            title: "feat: x".to_string(),
            body: String::new(),
            state,
            labels: labels.iter().map(|l| l.to_string()).collect(),
            head_ref: "feature/x".to_string(),
            base_ref: "main".to_string(),
            head_sha: "head1".to_string(),
            merge_commit_sha: (state == PullRequestState::Merged).then(|| "merge1".to_string()),
        }
    }

    fn snapshot(is_pull_request: bool, commits: Vec<RemoteCommit>) -> Snapshot {
        Snapshot {
            context: context(is_pull_request),
            target: "main".to_string(),
            default_branch: "main".to_string(),
            base_sha: "base1".to_string(),
            manifest: PackageManifest::parse(r#"{"pkg/a": {"latest": "1.0.0", "main": "1.0.0"}}"#, "main")
                .unwrap(),
            pull_request: None,
            on_release_branch: false,
            release_branch_exists: true,
            commits,
            manifest_touched: false,
            standing_pr: None,
            unreleased: BTreeMap::new(),
            prereleased: BTreeMap::new(),
        }
    }

    fn feature_commit() -> Vec<RemoteCommit> {
        vec![RemoteCommit::new("c1", "feat(a): x").with_files(["pkg/a/x.ts"])]
    }

    fn decide_for(snapshot: &Snapshot, config: &Config) -> Transition {
        let plan = ReleasePlan::compute(PlanInputs {
            manifest: &snapshot.manifest,
            commits: &snapshot.commits,
            target: &snapshot.target,
            repo: "mono",
            repo_url: None,
            changelog: &ChangelogConfig::default(),
        })
        .unwrap();
        decide(&RuleInput { snapshot, plan: &plan, config })
    }

    #[test]
    fn test_push_with_feature_opens_release_pr() {
        let snap = snapshot(false, feature_commit());
        assert_eq!(decide_for(&snap, &Config::default()), Transition::OpenReleasePr);
    }

    #[test]
    fn test_push_without_bumps_skips() {
        let commits = vec![RemoteCommit::new("c1", "docs: x").with_files(["pkg/a/README.md"])];
        let snap = snapshot(false, commits);
        assert_eq!(decide_for(&snap, &Config::default()), Transition::SkipNothingToRelease);
    }

    #[test]
    fn test_released_label_wins_over_everything_but_deleted_branch() {
        let mut snap = snapshot(true, feature_commit());
        snap.pull_request = Some(pr(PullRequestState::Merged, &["released", "prerelease"]));
        assert_eq!(decide_for(&snap, &Config::default()), Transition::SkipReleased);

        snap.on_release_branch = true;
        snap.release_branch_exists = false;
        assert_eq!(
            decide_for(&snap, &Config::default()),
            Transition::SettleDeletedBranch { number: Some(5), settle: true }
        );
    }

    #[test]
    fn test_deleted_branch_waits_for_pending_release() {
        let mut snap = snapshot(true, Vec::new());
        snap.pull_request = Some(pr(PullRequestState::Merged, &["release-me"]));
        snap.on_release_branch = true;
        snap.release_branch_exists = false;
        snap.unreleased.insert("pkg/a".to_string(), Version::new(1, 1, 0));

        let transition = decide_for(&snap, &Config::default());
        assert_eq!(transition, Transition::SettleDeletedBranch { number: Some(5), settle: false });
        assert!(transition.is_skip());
    }

    #[test]
    fn test_deleted_branch_of_closed_pr_is_not_settled() {
        let mut snap = snapshot(true, Vec::new());
        snap.pull_request = Some(pr(PullRequestState::Closed, &["release-me", "release-target:main"]));
        snap.on_release_branch = true;
        snap.release_branch_exists = false;

        let transition = decide_for(&snap, &Config::default());
        assert_eq!(transition, Transition::SettleDeletedBranch { number: Some(5), settle: false });
        assert!(transition.is_skip());
    }

    #[test]
    fn test_prerelease_label() {
        let mut snap = snapshot(true, feature_commit());
        snap.pull_request = Some(pr(PullRequestState::Open, &["prerelease"]));

        let mut config = Config::default();
        assert_eq!(
            decide_for(&snap, &config),
            Transition::SkipDisabledPrerelease { number: 5 }
        );

        config.prerelease.enabled = true;
        assert_eq!(
            decide_for(&snap, &config),
            Transition::Prerelease { number: 5, head_sha: "head1".to_string() }
        );

        snap.prereleased
            .insert("pkg/a".to_string(), Version::parse("1.1.0-rc.1").unwrap());
        assert!(decide_for(&snap, &config).is_skip());
        assert_eq!(
            decide_for(&snap, &config),
            Transition::SkipPrereleased { number: 5 }
        );

        snap.commits.clear();
        assert_eq!(decide_for(&snap, &config), Transition::SkipUnmergedEvent);
    }

    #[test]
    fn test_open_feature_pr_is_skipped() {
        let mut snap = snapshot(true, feature_commit());
        snap.pull_request = Some(pr(PullRequestState::Open, &[]));
        assert_eq!(decide_for(&snap, &Config::default()), Transition::SkipUnmergedEvent);
    }

    #[test]
    fn test_push_to_other_branch_is_skipped() {
        let mut snap = snapshot(false, feature_commit());
        snap.context.base_ref = "liftoff/release/main".to_string();
        assert_eq!(decide_for(&snap, &Config::default()), Transition::SkipUnmergedEvent);
    }

    #[test]
    fn test_merged_release_pr() {
        let mut snap = snapshot(true, feature_commit());
        snap.pull_request = Some(pr(PullRequestState::Merged, &["release-me", "release-target:main"]));
        snap.unreleased.insert("pkg/a".to_string(), Version::new(1, 1, 0));

        assert_eq!(
            decide_for(&snap, &Config::default()),
            Transition::MergedRelease { number: Some(5), commitish: "merge1".to_string() }
        );
    }

    #[test]
    fn test_merged_pr_for_other_target_is_not_released() {
        let mut snap = snapshot(true, feature_commit());
        snap.pull_request = Some(pr(PullRequestState::Merged, &["release-me", "release-target:canary"]));
        snap.unreleased.insert("pkg/a".to_string(), Version::new(1, 1, 0));

        assert_eq!(decide_for(&snap, &Config::default()), Transition::OpenReleasePr);
    }

    #[test]
    fn test_squash_merge_detected_by_manifest_diff() {
        let mut snap = snapshot(false, Vec::new());
        snap.manifest_touched = true;
        snap.unreleased.insert("pkg/a".to_string(), Version::new(1, 1, 0));

        assert_eq!(
            decide_for(&snap, &Config::default()),
            Transition::MergedRelease { number: None, commitish: "base1".to_string() }
        );

        snap.unreleased.clear();
        assert_eq!(decide_for(&snap, &Config::default()), Transition::SkipNothingToRelease);
    }

    #[test]
    fn test_matching_fingerprint_is_up_to_date() {
        let mut snap = snapshot(false, feature_commit());
        let plan = ReleasePlan::compute(PlanInputs {
            manifest: &snap.manifest,
            commits: &snap.commits,
            target: "main",
            repo: "mono",
            repo_url: None,
            changelog: &ChangelogConfig::default(),
        })
        .unwrap();

        let mut standing = pr(PullRequestState::Open, &["release-me", "release-target:main"]);
        standing.number = 9;
        standing.body = format!("notes\n\n{}", fingerprint_marker(&plan.fingerprint("base1")));
        snap.standing_pr = Some(standing);
        assert_eq!(decide_for(&snap, &Config::default()), Transition::SkipUpToDate { number: 9 });

        snap.base_sha = "base2".to_string();
        assert_eq!(decide_for(&snap, &Config::default()), Transition::OpenReleasePr);
    }

    #[test]
    fn test_catch_up_only() {
        let mut snap = snapshot(false, Vec::new());
        snap.target = "canary".to_string();
        assert_eq!(decide_for(&snap, &Config::default()), Transition::VersionBumpOnly);
    }

    #[test]
    fn test_rule_order_is_stable() {
        let names: Vec<&str> = RULES.iter().map(|r| r.name).collect();
        assert_eq!(
            names,
            vec![
                "deleted-release-branch",
                "already-released",
                "prerelease-disabled",
                "already-prereleased",
                "prerelease",
                "unmerged-event",
                "nothing-to-release",
                "merged-release",
                "up-to-date",
                "catch-up-only",
            ]
        );
    }
}
