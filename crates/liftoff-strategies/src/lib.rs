//! liftoff strategies - version bump decisions
//!
//! This crate folds classified commits into a bump and applies it to a
//! semantic version, optionally as a numbered release candidate.

mod bump;
mod semver;
pub mod types;

pub use bump::{bump_for_type, determine_bump, is_release_worthy};
pub use self::semver::{next_version, SemVerStrategy, RC_IDENTIFIER};
pub use types::BumpType;
