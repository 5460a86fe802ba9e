//! CLI commands

mod plan;
mod run;

pub use plan::PlanCommand;
pub use run::RunCommand;

use std::path::Path;

use clap::Args;
use console::style;
use tracing::info;

use liftoff_core::config::{load_config_or_default, validate_config, Config, JsonIndent};
use liftoff_core::ReleaseContext;
use liftoff_github::{GatewaySettings, GitHubClient, GitHubGateway, DEFAULT_API_URL};

use crate::cli::Cli;

/// Inputs shared by every command that talks to the repository
#[derive(Debug, Args)]
pub struct ReleaseArgs {
    /// API token (falls back to INPUT_TOKEN)
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Path of the release manifest
    #[arg(long, env = "INPUT_MANIFEST")]
    pub manifest: Option<String>,

    /// Release target to drive
    #[arg(long, env = "INPUT_TARGET")]
    pub target: Option<String>,

    /// Allow prereleases from labeled PRs
    #[arg(long, env = "INPUT_PRERELEASE")]
    pub prerelease: Option<bool>,

    /// Label that requests a prerelease
    #[arg(long, env = "INPUT_PRERELEASE_LABEL")]
    pub prerelease_label: Option<String>,

    /// Manifest indentation: `tab` or a number of spaces
    #[arg(long, env = "INPUT_JSON_INDENT")]
    pub json_indent: Option<JsonIndent>,

    /// REST API base URL
    #[arg(long, env = "GITHUB_API_URL", default_value = DEFAULT_API_URL)]
    pub api_url: String,
}

impl ReleaseArgs {
    /// Apply command-line and `INPUT_*` overrides on top of the file config
    pub fn apply(&self, config: &mut Config) {
        if let Some(manifest) = &self.manifest {
            config.manifest.path = manifest.clone();
        }
        if let Some(indent) = self.json_indent {
            config.manifest.indent = indent;
        }
        if let Some(target) = &self.target {
            config.release.target = target.clone();
        }
        if let Some(enabled) = self.prerelease {
            config.prerelease.enabled = enabled;
        }
        if let Some(label) = &self.prerelease_label {
            config.prerelease.label = label.clone();
        }
    }

    fn token(&self) -> anyhow::Result<String> {
        self.token
            .clone()
            .or_else(|| std::env::var("INPUT_TOKEN").ok())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| anyhow::anyhow!("No API token: pass --token or set GITHUB_TOKEN"))
    }
}

/// Everything a command needs to drive a run
pub struct Session {
    pub config: Config,
    pub context: ReleaseContext,
    pub gateway: GitHubGateway,
}

impl Session {
    /// Load config, read the CI context, and connect to the repository
    pub fn open(args: &ReleaseArgs, cli: &Cli) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        let config = load_config(args, &cwd, cli.quiet)?;

        let context = ReleaseContext::from_env()?;
        let client = GitHubClient::new(
            args.api_url.clone(),
            args.token()?,
            context.owner.clone(),
            context.repo.clone(),
        )?;
        let gateway = GitHubGateway::new(client, GatewaySettings::from_config(&config));

        info!(
            repo = %context.full_name(),
            target = %config.release.target,
            pull_request = ?context.pull_request_number,
            "session ready"
        );
        Ok(Self {
            config,
            context,
            gateway,
        })
    }
}

fn load_config(args: &ReleaseArgs, root: &Path, quiet: bool) -> anyhow::Result<Config> {
    let (mut config, config_path) = load_config_or_default(root)?;
    if config_path.is_none() && !quiet {
        println!(
            "{} No configuration found in {}, using defaults",
            style("!").yellow().bold(),
            style(root.display()).cyan()
        );
    }

    args.apply(&mut config);
    validate_config(&config)?;
    Ok(config)
}
