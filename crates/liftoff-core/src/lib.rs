//! liftoff core - shared types, errors, and configuration
//!
//! This crate provides the error taxonomy, configuration, the release
//! manifest model, and the data types passed between the commit classifier,
//! the source-control gateway, and the release orchestrator.

pub mod config;
pub mod context;
pub mod error;
pub mod manifest;
pub mod types;

pub use context::ReleaseContext;
pub use error::{LiftoffError, RemoteError, Result};
pub use manifest::{PackageManifest, PackageTargetVersions};
pub use types::{CommitType, ConventionalCommit, PackageChanges, ReleaseOutput, ReleasedPackage};
