//! Carrier registry

use std::sync::Arc;

use liftoff_core::error::{ConfigError, Result};
use liftoff_core::types::is_root_path;
use tracing::{debug, info, instrument};

use crate::cargo::CargoCarrier;
use crate::npm::NpmCarrier;
use crate::plain::VersionFileCarrier;
use crate::traits::VersionCarrier;

/// A rewritten carrier file, ready to commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionEdit {
    /// Path relative to the repository root, `/`-separated
    pub path: String,
    /// Name of the carrier that produced the edit
    pub carrier: &'static str,
    /// Version before the edit
    pub previous: String,
    /// Full new file content
    pub content: String,
}

/// Registry of version carriers, in priority order
pub struct CarrierRegistry {
    carriers: Vec<Arc<dyn VersionCarrier>>,
}

impl CarrierRegistry {
    /// Create a registry with the built-in carriers:
    /// `package.json`, then `Cargo.toml`, then `VERSION`
    pub fn new() -> Self {
        Self {
            carriers: vec![
                Arc::new(NpmCarrier::new()),
                Arc::new(CargoCarrier::new()),
                Arc::new(VersionFileCarrier::new()),
            ],
        }
    }

    /// Carrier file names, in priority order
    pub fn file_names(&self) -> Vec<&'static str> {
        self.carriers.iter().map(|c| c.file_name()).collect()
    }

    /// Find the first carrier present for the package at `package_path`,
    /// reading candidate files (by repository path) through `read`.
    ///
    /// Returns the carrier with the file's repository path and content.
    pub fn locate_with<F>(
        &self,
        package_path: &str,
        mut read: F,
    ) -> Result<(Arc<dyn VersionCarrier>, String, String)>
    where
        F: FnMut(&str) -> Result<Option<String>>,
    {
        for carrier in &self.carriers {
            let file = repo_relative(package_path, carrier.file_name());
            let Some(content) = read(&file)? else {
                continue;
            };
            if carrier.accepts(&content) {
                debug!(carrier = carrier.name(), file = %file, "located version carrier");
                return Ok((Arc::clone(carrier), file, content));
            }
        }

        Err(ConfigError::Unversionable {
            path: package_path.to_string(),
            candidates: self.file_names().join(", "),
        }
        .into())
    }

    /// Rewrite the package's version carrier read through `read`, returning
    /// the edit without writing it anywhere
    #[instrument(skip(self, read))]
    pub fn rewrite_with<F>(&self, package_path: &str, version: &str, read: F) -> Result<VersionEdit>
    where
        F: FnMut(&str) -> Result<Option<String>>,
    {
        let (carrier, path, content) = self.locate_with(package_path, read)?;
        let previous = carrier.read_version(&content)?;
        let content = carrier.set_version(&content, version)?;

        info!(path = %path, carrier = carrier.name(), from = %previous, to = version, "rewrote package version");

        Ok(VersionEdit {
            path,
            carrier: carrier.name(),
            previous,
            content,
        })
    }
}

impl Default for CarrierRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Repository path of a file inside a package directory
pub fn repo_relative(package_path: &str, file_name: &str) -> String {
    if is_root_path(package_path) {
        file_name.to_string()
    } else {
        format!("{}/{}", package_path.trim_end_matches('/'), file_name)
    }
}
