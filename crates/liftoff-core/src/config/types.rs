//! Configuration types

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::defaults::{
    DEFAULT_BRANCH_PREFIX, DEFAULT_CHANGELOG_FILE, DEFAULT_LOOKBACK, DEFAULT_MANIFEST_PATH,
    DEFAULT_PENDING_LABEL, DEFAULT_PRERELEASE_LABEL, DEFAULT_RELEASED_LABEL, DEFAULT_TARGET,
    DEFAULT_TARGET_LABEL_PREFIX,
};

/// Main configuration for liftoff
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Version of the config schema
    #[serde(rename = "$schema", skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,

    /// Release manifest location and formatting
    pub manifest: ManifestConfig,

    /// Release target and branch settings
    pub release: ReleaseTargetConfig,

    /// Prerelease settings
    pub prerelease: PrereleaseConfig,

    /// Labels used as the PR control surface
    pub labels: LabelConfig,

    /// Changelog configuration
    pub changelog: ChangelogConfig,
}

/// Release manifest configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestConfig {
    /// Path of the manifest, relative to the repository root
    pub path: String,

    /// Indentation used when the manifest is written back
    pub indent: JsonIndent,
}

impl Default for ManifestConfig {
    fn default() -> Self {
        Self {
            path: DEFAULT_MANIFEST_PATH.to_string(),
            indent: JsonIndent::default(),
        }
    }
}

/// Release target configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseTargetConfig {
    /// Name of the release target (e.g. `main`, `canary`)
    pub target: String,

    /// Default branch override; resolved from the repository when unset
    pub default_branch: Option<String>,

    /// Prefix for release branches; the target name is appended
    pub branch_prefix: String,

    /// Number of commits scanned when no prior release exists
    pub lookback: usize,
}

impl Default for ReleaseTargetConfig {
    fn default() -> Self {
        Self {
            target: DEFAULT_TARGET.to_string(),
            default_branch: None,
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
            lookback: DEFAULT_LOOKBACK,
        }
    }
}

impl ReleaseTargetConfig {
    /// Release branch for the configured target
    pub fn release_branch(&self) -> String {
        format!("{}/{}", self.branch_prefix.trim_end_matches('/'), self.target)
    }
}

/// Prerelease configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PrereleaseConfig {
    /// Whether prerelease candidates may be cut on this run
    pub enabled: bool,

    /// PR label that requests a prerelease
    pub label: String,
}

impl Default for PrereleaseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            label: DEFAULT_PRERELEASE_LABEL.to_string(),
        }
    }
}

/// Labels that drive the release lifecycle
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelConfig {
    /// Label on a release PR that has not shipped yet
    pub pending: String,

    /// Terminal label once tags and releases exist
    pub released: String,

    /// Prefix for the label naming the release target
    pub target_prefix: String,
}

impl Default for LabelConfig {
    fn default() -> Self {
        Self {
            pending: DEFAULT_PENDING_LABEL.to_string(),
            released: DEFAULT_RELEASED_LABEL.to_string(),
            target_prefix: DEFAULT_TARGET_LABEL_PREFIX.to_string(),
        }
    }
}

impl LabelConfig {
    /// Label naming a specific release target
    pub fn target_label(&self, target: &str) -> String {
        format!("{}{}", self.target_prefix, target)
    }
}

/// Changelog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChangelogConfig {
    /// Changelog file name inside each package directory
    pub file: String,

    /// Whether to include short commit hashes
    pub include_hashes: bool,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        Self {
            file: DEFAULT_CHANGELOG_FILE.to_string(),
            include_hashes: true,
        }
    }
}

/// Indentation style for JSON written by liftoff
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JsonIndent {
    /// One tab per level
    Tab,
    /// N spaces per level
    Spaces(u8),
}

impl Default for JsonIndent {
    fn default() -> Self {
        Self::Spaces(2)
    }
}

impl JsonIndent {
    /// Bytes emitted for one indentation level
    pub fn as_bytes(&self) -> Vec<u8> {
        match self {
            Self::Tab => b"\t".to_vec(),
            Self::Spaces(n) => vec![b' '; usize::from(*n)],
        }
    }
}

impl std::fmt::Display for JsonIndent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Tab => write!(f, "tab"),
            Self::Spaces(n) => write!(f, "{}", n),
        }
    }
}

impl std::str::FromStr for JsonIndent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("tab") || s == "\\t" || s == "\t" {
            return Ok(Self::Tab);
        }
        s.parse::<u8>()
            .map(Self::Spaces)
            .map_err(|_| format!("Unknown JSON indentation: {} (expected 'tab' or a number)", s))
    }
}

impl Serialize for JsonIndent {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Tab => serializer.serialize_str("tab"),
            Self::Spaces(n) => serializer.serialize_u8(*n),
        }
    }
}

impl<'de> Deserialize<'de> for JsonIndent {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Number(u8),
            Text(String),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Number(n) => Ok(Self::Spaces(n)),
            Raw::Text(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}
