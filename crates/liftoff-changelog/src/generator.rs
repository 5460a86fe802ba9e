//! Changelog generation

use liftoff_core::config::ChangelogConfig;
use liftoff_core::types::ConventionalCommit;
use tracing::{debug, instrument};

use crate::formatter::{ChangelogFormatter, MarkdownFormatter};
use crate::types::{ChangelogEntry, Section, SectionKind};

/// Changelog generator
pub struct ChangelogGenerator {
    formatter: Box<dyn ChangelogFormatter>,
    config: ChangelogConfig,
}

impl ChangelogGenerator {
    /// Create a new generator with the markdown formatter
    pub fn new(config: ChangelogConfig) -> Self {
        Self {
            formatter: Box::new(MarkdownFormatter::new()),
            config,
        }
    }

    /// Use a custom formatter
    pub fn with_formatter<F: ChangelogFormatter + 'static>(mut self, formatter: F) -> Self {
        self.formatter = Box::new(formatter);
        self
    }

    /// Group commits into sections, keeping input order inside each section
    #[instrument(skip(self, commits), fields(commit_count = commits.len()))]
    pub fn generate(&self, commits: &[ConventionalCommit]) -> ChangelogEntry {
        let mut sections: Vec<Section> = SectionKind::ALL.iter().map(|k| Section::new(*k)).collect();

        for commit in commits {
            if let Some(kind) = SectionKind::for_type(commit.commit_type) {
                // ALL is in discriminant order
                sections[kind as usize].add_commit(commit.clone());
            }
        }

        let mut entry = ChangelogEntry::default();
        for section in sections {
            entry.add_section(section);
        }

        debug!(
            section_count = entry.sections.len(),
            breaking_count = entry.breaking_count(),
            "changelog sections built"
        );
        entry
    }

    /// Format a changelog entry to string
    pub fn format(&self, entry: &ChangelogEntry) -> String {
        self.formatter.format(entry, &self.config)
    }

    /// Generate and format in one step
    pub fn generate_formatted(&self, commits: &[ConventionalCommit]) -> String {
        let entry = self.generate(commits);
        self.format(&entry)
    }
}

impl Default for ChangelogGenerator {
    fn default() -> Self {
        Self::new(ChangelogConfig::default())
    }
}

/// Render commits as grouped markdown with the default settings
pub fn changelog(commits: &[ConventionalCommit]) -> String {
    ChangelogGenerator::default().generate_formatted(commits)
}
