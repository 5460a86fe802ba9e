//! liftoff changelog - commit classification and changelog rendering
//!
//! This crate classifies commit messages against the conventional-commit
//! grammar and renders grouped markdown changelogs from the result.

pub mod file;
pub mod formatter;
pub mod generator;
pub mod parser;
pub mod types;

pub use generator::{changelog, ChangelogGenerator};
pub use parser::{classify, parse_commit, split_squashed, ConventionalParser};
pub use types::{ChangelogEntry, Section, SectionKind};
