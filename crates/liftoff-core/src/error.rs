//! Error types for liftoff

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using LiftoffError
pub type Result<T> = std::result::Result<T, LiftoffError>;

/// Main error type for liftoff operations
#[derive(Debug, Error)]
pub enum LiftoffError {
    /// Configuration-related errors
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Errors from the hosting platform
    #[error(transparent)]
    Remote(#[from] RemoteError),

    /// Version-related errors
    #[error(transparent)]
    Version(#[from] VersionError),

    /// Changelog-related errors
    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// Version carrier errors
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Workflow-related errors
    #[error(transparent)]
    Workflow(#[from] WorkflowError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found
    #[error("Configuration file not found at {0}")]
    NotFound(PathBuf),

    /// Failed to parse configuration
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {field} - {message}")]
    InvalidValue { field: String, message: String },

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// The release target uses a reserved name
    #[error("Release target '{0}' is reserved; it names the version ceiling, not a target")]
    ReservedTarget(String),

    /// Package has no file liftoff knows how to version
    #[error("Package '{path}' cannot be versioned: none of {candidates} found")]
    Unversionable { path: String, candidates: String },

    /// Manifest file missing where one is required
    #[error("Release manifest not found at {0}")]
    MissingManifest(String),

    /// YAML parsing error
    #[error("YAML parsing error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    /// IO error
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors reported by the source-control host
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Resource does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resource already exists (tag, branch, release)
    #[error("Already exists: {0}")]
    Conflict(String),

    /// Credential lacks permission for the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Rate limited by the host
    #[error("Rate limited, retry after {retry_after:?} seconds")]
    RateLimited { retry_after: Option<u64> },

    /// Any other API failure
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Network or TLS failure
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body could not be decoded
    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Whether this error means the write was already applied by an earlier run
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }

    /// Whether this error means the resource is absent
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Version-related errors
#[derive(Debug, Error)]
pub enum VersionError {
    /// Failed to parse version
    #[error("Failed to parse version '{0}': {1}")]
    ParseFailed(String, String),

    /// Invalid version format
    #[error("Invalid version format: {0}")]
    InvalidFormat(String),

    /// A target would move backwards
    #[error("Version for {path} on {target} would regress from {current} to {next}")]
    Regression {
        path: String,
        target: String,
        current: String,
        next: String,
    },

    /// A version field cannot be incremented any further
    #[error("Cannot bump {field} of {version}: already at its maximum")]
    Overflow { version: String, field: &'static str },

    /// Semver error
    #[error("Semver error: {0}")]
    Semver(#[from] semver::Error),
}

/// Changelog-related errors
#[derive(Debug, Error)]
pub enum ChangelogError {
    /// Failed to generate changelog
    #[error("Failed to generate changelog: {0}")]
    GenerationFailed(String),

    /// Failed to update a changelog file
    #[error("Failed to write changelog: {0}")]
    WriteFailed(String),
}

/// Version carrier errors
#[derive(Debug, Error)]
pub enum AdapterError {
    /// Package manifest not found
    #[error("Package manifest not found at {0}")]
    ManifestNotFound(PathBuf),

    /// Failed to parse manifest
    #[error("Failed to parse manifest: {0}")]
    ManifestParseError(String),

    /// Failed to update manifest
    #[error("Failed to update manifest: {0}")]
    ManifestUpdateError(String),
}

/// Workflow-related errors
#[derive(Debug, Error)]
pub enum WorkflowError {
    /// Pre-condition not met
    #[error("Pre-condition not met: {0}")]
    PreConditionFailed(String),

    /// Step failed
    #[error("Workflow step '{step}' failed: {reason}")]
    StepFailed { step: String, reason: String },
}

impl LiftoffError {
    /// Create a new "other" error with a message
    pub fn other<S: Into<String>>(msg: S) -> Self {
        Self::Other(msg.into())
    }

    /// Whether this is a remote conflict (tag/branch already exists)
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_conflict())
    }

    /// Whether this is a remote "not found"
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_not_found())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_is_distinct_from_permission() {
        let conflict: LiftoffError = RemoteError::Conflict("tag pkg-v1.0.0".into()).into();
        let denied: LiftoffError = RemoteError::PermissionDenied("refs".into()).into();

        assert!(conflict.is_conflict());
        assert!(!denied.is_conflict());
        assert!(!denied.is_not_found());
    }

    #[test]
    fn test_reserved_target_message() {
        let err = ConfigError::ReservedTarget("latest".into());
        assert!(err.to_string().contains("reserved"));
    }
}
