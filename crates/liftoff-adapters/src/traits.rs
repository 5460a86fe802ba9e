//! Version carrier traits

use liftoff_core::error::Result;

/// A per-package file that records the package's version.
///
/// Carriers work on file content so the same edit applies to a working
/// checkout or to a blob fetched from the remote.
pub trait VersionCarrier: Send + Sync {
    /// Get the carrier name (e.g., "npm", "cargo")
    fn name(&self) -> &'static str;

    /// File name inside the package directory
    fn file_name(&self) -> &'static str;

    /// Whether `content` is a file this carrier can version
    fn accepts(&self, _content: &str) -> bool {
        true
    }

    /// Read the version field
    fn read_version(&self, content: &str) -> Result<String>;

    /// Rewrite only the version field, preserving everything else
    fn set_version(&self, content: &str, version: &str) -> Result<String>;
}
