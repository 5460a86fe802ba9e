//! npm package carrier

mod manifest;

use liftoff_core::error::{AdapterError, Result};

use crate::traits::VersionCarrier;
pub use manifest::PackageJson;

/// Versions a package through its `package.json`
pub struct NpmCarrier;

impl NpmCarrier {
    /// Create a new npm carrier
    pub fn new() -> Self {
        Self
    }
}

impl Default for NpmCarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionCarrier for NpmCarrier {
    fn name(&self) -> &'static str {
        "npm"
    }

    fn file_name(&self) -> &'static str {
        "package.json"
    }

    fn read_version(&self, content: &str) -> Result<String> {
        PackageJson::parse(content)?.version.ok_or_else(|| {
            AdapterError::ManifestParseError("package.json has no version field".to_string())
                .into()
        })
    }

    fn set_version(&self, content: &str, version: &str) -> Result<String> {
        PackageJson::update_version(content, version)
    }
}
