//! Markdown changelog formatter

use liftoff_core::config::ChangelogConfig;
use liftoff_core::types::ConventionalCommit;
use tracing::{debug, instrument};

use super::ChangelogFormatter;
use crate::types::{ChangelogEntry, BREAKING_MARKER};

/// Markdown changelog formatter
#[derive(Debug, Clone, Default)]
pub struct MarkdownFormatter {
    /// Repository URL for commit links
    pub repo_url: Option<String>,
}

impl MarkdownFormatter {
    /// Create a new markdown formatter
    pub fn new() -> Self {
        Self::default()
    }

    /// Set repository URL for links
    pub fn with_repo_url(mut self, url: impl Into<String>) -> Self {
        self.repo_url = Some(url.into());
        self
    }

    fn format_item(&self, commit: &ConventionalCommit, config: &ChangelogConfig) -> String {
        let mut line = String::from("- ");

        if commit.breaking {
            line.push_str(BREAKING_MARKER);
            line.push(' ');
        }
        line.push_str(&commit.message);

        if let Some(scope) = &commit.scope {
            line.push_str(&format!(" ({})", scope));
        }

        if config.include_hashes && !commit.source_ref.is_empty() {
            let short_hash = &commit.source_ref[..7.min(commit.source_ref.len())];
            match &self.repo_url {
                Some(repo_url) => line.push_str(&format!(
                    " ([{}]({}/commit/{}))",
                    short_hash, repo_url, commit.source_ref
                )),
                None => line.push_str(&format!(" ({})", short_hash)),
            }
        }

        line
    }
}

impl ChangelogFormatter for MarkdownFormatter {
    #[instrument(skip(self, entry, config), fields(section_count = entry.sections.len()))]
    fn format(&self, entry: &ChangelogEntry, config: &ChangelogConfig) -> String {
        let mut blocks = Vec::new();

        for section in &entry.sections {
            let mut block = format!("### {}\n\n", section.title());
            for commit in &section.commits {
                block.push_str(&self.format_item(commit, config));
                block.push('\n');
            }
            blocks.push(block);
        }

        let output = blocks.join("\n");
        debug!(output_len = output.len(), "markdown changelog formatted");
        output
    }
}
