//! Cargo package carrier

mod manifest;

use liftoff_core::error::{AdapterError, Result};

use crate::traits::VersionCarrier;
pub use manifest::CargoToml;

/// Versions a package through its `Cargo.toml`
pub struct CargoCarrier;

impl CargoCarrier {
    /// Create a new Cargo carrier
    pub fn new() -> Self {
        Self
    }
}

impl Default for CargoCarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionCarrier for CargoCarrier {
    fn name(&self) -> &'static str {
        "cargo"
    }

    fn file_name(&self) -> &'static str {
        "Cargo.toml"
    }

    /// Virtual workspace manifests are not packages
    fn accepts(&self, content: &str) -> bool {
        CargoToml::parse(content).is_ok_and(|toml| toml.has_package())
    }

    fn read_version(&self, content: &str) -> Result<String> {
        CargoToml::parse(content)?.version().ok_or_else(|| {
            AdapterError::ManifestParseError("Cargo.toml has no package version".to_string())
                .into()
        })
    }

    fn set_version(&self, content: &str, version: &str) -> Result<String> {
        CargoToml::update_version(content, version)
    }
}
