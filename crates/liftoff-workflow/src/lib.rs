//! liftoff workflow - the release lifecycle
//!
//! Each run reads a [`Snapshot`] of the repository, computes a
//! [`ReleasePlan`], picks exactly one [`Transition`] from an ordered rule
//! table, and executes it through a [`SourceControl`](liftoff_github::SourceControl)
//! gateway. No state is kept between runs; re-running on the same remote
//! state is safe.

mod actions;
#[cfg(test)]
mod mocks;
pub mod orchestrator;
pub mod plan;
pub mod rules;
pub mod snapshot;

pub use actions::{pr_body, prerelease_comment};
pub use orchestrator::{Evaluation, Orchestrator, RunOutcome};
pub use plan::{PlanInputs, ReleasePlan};
pub use rules::{decide, Rule, RuleInput, Transition, RULES};
pub use snapshot::Snapshot;
