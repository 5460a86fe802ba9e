//! liftoff adapters - per-package version carriers
//!
//! This crate finds the file that records a package's version
//! (`package.json`, `Cargo.toml`, or a bare `VERSION` file) and rewrites
//! only its version field.

pub mod cargo;
pub mod npm;
pub mod plain;
pub mod registry;
mod traits;

pub use cargo::CargoCarrier;
pub use npm::NpmCarrier;
pub use plain::VersionFileCarrier;
pub use registry::{repo_relative, CarrierRegistry, VersionEdit};
pub use traits::VersionCarrier;
