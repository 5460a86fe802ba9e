//! Run command

use clap::Args;
use console::style;
use tracing::info;

use liftoff_workflow::Orchestrator;

use crate::cli::output::{self, github};
use crate::cli::{Cli, OutputFormat};

use super::{ReleaseArgs, Session};

/// Advance the release lifecycle for the triggering event
#[derive(Debug, Args)]
pub struct RunCommand {
    #[command(flatten)]
    pub args: ReleaseArgs,
}

impl RunCommand {
    /// Execute the run command
    pub async fn execute(&self, cli: &Cli) -> anyhow::Result<()> {
        info!(
            target = ?self.args.target,
            prerelease = ?self.args.prerelease,
            "executing run command"
        );
        let session = Session::open(&self.args, cli)?;
        let outcome = Orchestrator::new(&session.gateway, &session.config)
            .run(session.context.clone())
            .await?;

        github::write_outputs(&outcome.output)?;

        if cli.quiet {
            return Ok(());
        }

        match cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            }
            OutputFormat::Text => {
                if outcome.output.released {
                    let kind = if outcome.output.prerelease {
                        "prerelease"
                    } else {
                        "release"
                    };
                    output::success(&format!("Cut {} for:", kind));
                    for package in &outcome.output.packages {
                        println!(
                            "  {} {}",
                            output::path_style().apply_to(&package.path),
                            output::version_style().apply_to(&package.version)
                        );
                    }
                } else if let Some(number) = outcome.output.pull_request {
                    output::success(&format!("Release PR #{} is up to date", number));
                } else {
                    output::info(&format!(
                        "Nothing to do ({})",
                        style(&outcome.transition).dim()
                    ));
                }
            }
        }
        Ok(())
    }
}
