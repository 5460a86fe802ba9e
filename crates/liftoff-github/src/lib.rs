//! liftoff github - the source-control gateway
//!
//! This crate defines the [`SourceControl`] contract the release orchestrator
//! drives, and implements it over the GitHub REST API: commit history since
//! the last release, the release manifest and changelogs on the default
//! branch, release branches and PRs, tags, releases, labels, and comments.

mod client;
mod commits;
mod contents;
mod gateway;
pub mod naming;
mod pulls;
mod releases;
mod traits;
pub mod types;

pub use client::{GitHubClient, DEFAULT_API_URL};
pub use gateway::{GatewaySettings, GitHubGateway};
pub use releases::release_body;
pub use traits::{filter_for_package, SourceControl};
pub use types::{FileEdit, PullRequest, PullRequestState, Release, ReleasePrRequest, RemoteCommit};
