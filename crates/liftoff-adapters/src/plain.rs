//! Bare `VERSION` file carrier

use liftoff_core::error::{AdapterError, Result};

use crate::traits::VersionCarrier;

/// Versions a package through a file holding only the version string
pub struct VersionFileCarrier;

impl VersionFileCarrier {
    /// Create a new VERSION file carrier
    pub fn new() -> Self {
        Self
    }
}

impl Default for VersionFileCarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionCarrier for VersionFileCarrier {
    fn name(&self) -> &'static str {
        "version-file"
    }

    fn file_name(&self) -> &'static str {
        "VERSION"
    }

    fn read_version(&self, content: &str) -> Result<String> {
        let version = content.trim();
        if version.is_empty() {
            return Err(AdapterError::ManifestParseError("VERSION file is empty".to_string()).into());
        }
        Ok(version.to_string())
    }

    fn set_version(&self, content: &str, version: &str) -> Result<String> {
        // Keep whatever line ending the file used
        let ending = if content.ends_with("\r\n") {
            "\r\n"
        } else if content.ends_with('\n') || content.is_empty() {
            "\n"
        } else {
            ""
        };
        Ok(format!("{}{}", version, ending))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let carrier = VersionFileCarrier::new();
        assert_eq!(carrier.read_version("1.4.0\n").unwrap(), "1.4.0");
        assert_eq!(carrier.set_version("1.4.0\n", "1.5.0").unwrap(), "1.5.0\n");
        assert_eq!(carrier.set_version("1.4.0", "1.5.0").unwrap(), "1.5.0");
    }

    #[test]
    fn test_empty_file() {
        assert!(VersionFileCarrier::new().read_version("  \n").is_err());
    }
}
