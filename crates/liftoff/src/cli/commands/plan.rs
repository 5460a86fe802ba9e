//! Plan command

use clap::Args;
use console::style;
use tracing::info;

use liftoff_workflow::{Evaluation, Orchestrator};

use crate::cli::output;
use crate::cli::{Cli, OutputFormat};

use super::{ReleaseArgs, Session};

/// Show what a run would do, without writing anything
#[derive(Debug, Args)]
pub struct PlanCommand {
    #[command(flatten)]
    pub args: ReleaseArgs,
}

impl PlanCommand {
    /// Execute the plan command
    pub async fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(target = ?self.args.target, "executing plan command");
        let session = Session::open(&self.args, cli)?;
        let evaluation = Orchestrator::new(&session.gateway, &session.config)
            .evaluate(session.context.clone())
            .await?;

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&evaluation)?);
            }
            OutputFormat::Text => print_text(&evaluation),
        }
        Ok(())
    }
}

fn print_text(evaluation: &Evaluation) {
    let snapshot = &evaluation.snapshot;
    println!(
        "{}",
        output::header(&format!("Release plan for target '{}'", snapshot.target))
    );
    println!();
    println!("{}", output::key_value("Default branch", &snapshot.default_branch));
    println!("{}", output::key_value("Base commit", &snapshot.base_sha));
    println!(
        "{}",
        output::key_value("Commits since release", &snapshot.commits.len().to_string())
    );
    if let Some(pr) = &snapshot.standing_pr {
        println!(
            "{}",
            output::key_value("Release PR", &format!("#{} {}", pr.number, pr.title))
        );
    }
    println!();

    if evaluation.plan.is_empty() {
        println!("  {}", style("No packages to release").dim());
    }
    for change in &evaluation.plan.changes {
        let from = change
            .current_version
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| "none".to_string());
        let note = if change.is_catch_up() {
            "catch-up".to_string()
        } else {
            format!("{} commits", change.commits.len())
        };
        println!(
            "  {} {} → {} {}",
            output::path_style().apply_to(&change.path),
            from,
            output::version_style().apply_to(&change.new_version),
            style(format!("({})", note)).dim()
        );
    }

    println!();
    println!(
        "{}",
        output::key_value("Transition", &output::tag_style().apply_to(&evaluation.transition).to_string())
    );
}
