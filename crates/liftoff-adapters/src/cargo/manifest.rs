//! Cargo.toml handling

use liftoff_core::error::{AdapterError, Result};
use serde::Deserialize;
use toml_edit::{value, DocumentMut, Item};

/// Cargo.toml structure (for reading)
#[derive(Debug, Clone, Deserialize)]
pub struct CargoToml {
    /// Package section
    pub package: Option<Package>,
    /// Workspace section
    pub workspace: Option<Workspace>,
}

/// Package section
#[derive(Debug, Clone, Deserialize)]
pub struct Package {
    /// Package name
    pub name: String,
    /// Package version, absent or inherited in workspaces
    #[serde(default)]
    pub version: Option<toml::Value>,
}

/// Workspace section
#[derive(Debug, Clone, Deserialize)]
pub struct Workspace {
    /// Shared package settings
    pub package: Option<WorkspacePackage>,
}

/// `[workspace.package]` section
#[derive(Debug, Clone, Deserialize)]
pub struct WorkspacePackage {
    /// Shared version
    pub version: Option<String>,
}

impl CargoToml {
    /// Parse Cargo.toml content
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| AdapterError::ManifestParseError(e.to_string()).into())
    }

    /// Whether the manifest declares a package
    pub fn has_package(&self) -> bool {
        self.package.is_some()
    }

    /// Version the package resolves to, following `version.workspace = true`
    pub fn version(&self) -> Option<String> {
        let workspace_version = || {
            self.workspace
                .as_ref()
                .and_then(|w| w.package.as_ref())
                .and_then(|p| p.version.clone())
        };

        match self.package.as_ref().and_then(|p| p.version.as_ref()) {
            Some(toml::Value::String(v)) => Some(v.clone()),
            _ => workspace_version(),
        }
    }

    /// Update version in Cargo.toml (preserves formatting using toml_edit).
    ///
    /// A package that inherits its version writes `[workspace.package]` when
    /// that table lives in the same file.
    pub fn update_version(content: &str, version: &str) -> Result<String> {
        let mut doc: DocumentMut = content
            .parse()
            .map_err(|e: toml_edit::TomlError| AdapterError::ManifestParseError(e.to_string()))?;

        let package_version = doc
            .get("package")
            .and_then(|p| p.get("version"))
            .map(|v| v.is_str());

        match package_version {
            Some(true) => {
                doc["package"]["version"] = value(version);
            }
            _ if doc
                .get("workspace")
                .and_then(|w| w.get("package"))
                .and_then(|p| p.get("version"))
                .is_some_and(Item::is_str) =>
            {
                doc["workspace"]["package"]["version"] = value(version);
            }
            _ => {
                return Err(AdapterError::ManifestUpdateError(
                    "Cargo.toml has no version field in this file".to_string(),
                )
                .into());
            }
        }

        Ok(doc.to_string())
    }
}
